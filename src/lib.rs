//! Spotify Playlist Cleaner Library
//!
//! This library authenticates against the Spotify Web API, fetches the full
//! playlist collection of the current user, filters it with simple predicates
//! and unfollows a confirmed subset. The command-line binary is a thin layer
//! over [`management::PlaylistCleaner`].
//!
//! # Modules
//!
//! - `api` - Request handlers for the local OAuth callback listener
//! - `cli` - Command-line command implementations (tables, prompts, progress)
//! - `config` - Environment loading and the resolved [`config::Config`]
//! - `error` - Error taxonomy shared by all components
//! - `management` - Token lifecycle, fetching, filtering and unfollowing
//! - `retry` - Rate-limit and transient-failure retry state machine
//! - `server` - Loopback listener that receives the OAuth redirect
//! - `spotify` - Spotify token endpoint and Web API clients
//! - `types` - Data structures and wire types
//! - `utils` - PKCE helpers and the clock/sleep seams
//!
//! # Example
//!
//! ```
//! use spotify_cleaner::{config, management::PlaylistCleaner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), spotify_cleaner::Error> {
//!     config::load_env().await?;
//!     let cleaner = PlaylistCleaner::from_config(config::Config::from_env()?)?;
//!     let playlists = cleaner.list_playlists(&Default::default()).await?;
//!     println!("{} playlists", playlists.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod retry;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{ApiError, AuthError, BatchInterrupted, ConfigError, Error, FilterError};

/// Result alias used across the crate.
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// Accepts the same arguments as `println!`.
///
/// ```
/// info!("Fetching playlists...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// ```
/// success!("Unfollowed {} playlists", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits with status 1.
///
/// Only the command layer uses this; the library propagates errors instead.
///
/// ```
/// error!("Authentication failed: {}", e);
/// // unreachable
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// ```
/// warning!("No playlists matched the given filters");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
