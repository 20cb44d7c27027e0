//! # CLI Module
//!
//! Thin presentation layer over [`crate::management::PlaylistCleaner`]. Each
//! command turns its flags into core inputs, renders results with `tabled`
//! and `indicatif`, and reports failures through the crate's output macros.
//!
//! ## Commands
//!
//! - [`list`] - Shows playlists, one API page at a time or filtered locally
//! - [`clean`] - Previews, confirms and unfollows playlists; without filters
//!   or IDs it offers a checklist of every playlist
//! - [`auth`] - Makes sure a usable credential is stored
//! - [`test_auth`] - Fetches the current user's profile
//! - [`logout`] - Removes the stored credential
//!
//! ## Usage
//!
//! ```bash
//! spotify-cleaner auth
//! spotify-cleaner list --page 2 --limit 20
//! spotify-cleaner list --owner not-me --empty
//! spotify-cleaner clean --name '^Daily Mix' --dry-run
//! spotify-cleaner clean --owner not-me --no-description --yes
//! spotify-cleaner clean
//! ```
//!
//! Errors are fatal here: [`crate::error!`] prints them and exits with
//! status 1. Partial unfollow progress is printed before exiting.

mod auth;
mod clean;
mod list;
mod select;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use auth::{auth, logout, test_auth};
pub use clean::clean;
pub use list::list;
pub use select::{choice_label, picked};

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
