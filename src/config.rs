//! Configuration management for the playlist cleaner.
//!
//! Values come from environment variables, optionally seeded from `.env`
//! files. Resolution order:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the local data directory, then `.env` in the working directory
//! 3. Application defaults

use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use reqwest::Url;

use crate::{error::ConfigError, retry::RetryPolicy};

pub const APP_NAME: &str = "spotify-cleaner";

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SCOPE: &str = "user-read-email playlist-modify-public playlist-modify-private playlist-read-private playlist-read-collaborative";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRY_AFTER_SECS: u64 = 120;

/// Loads environment variables from `.env` files.
///
/// Looks in the platform-specific local data directory first:
/// - Linux: `~/.local/share/spotify-cleaner/.env`
/// - macOS: `~/Library/Application Support/spotify-cleaner/.env`
/// - Windows: `%LOCALAPPDATA%/spotify-cleaner/.env`
///
/// and then in the working directory. Missing files are skipped; variables
/// already present in the process environment are never overridden.
pub async fn load_env() -> Result<(), ConfigError> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|e| ConfigError::EnvFile {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

    for path in [dir.join(".env"), PathBuf::from(".env")] {
        if !path.is_file() {
            continue;
        }
        dotenv::from_path(&path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    Ok(())
}

/// `<data_local_dir>/spotify-cleaner`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_NAME);
    path
}

/// Where credentials live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreKind {
    /// OS keychain / secret service.
    Keyring,
    /// JSON file in the data directory.
    File,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: Url,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub callback_timeout: Duration,
    pub token_store: TokenStoreKind,
    pub max_retry_after: Duration,
}

impl Config {
    /// Resolves the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = get("SPOTIFY_CLIENT_ID").ok_or(ConfigError::Missing("SPOTIFY_CLIENT_ID"))?;

        let redirect = get("SPOTIFY_REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.into());
        let redirect_uri = Url::parse(&redirect).map_err(|e| ConfigError::Invalid {
            key: "SPOTIFY_REDIRECT_URI",
            reason: e.to_string(),
        })?;

        let token_store = match get("SPOTIFY_CLEANER_TOKEN_STORE").as_deref() {
            None | Some("keyring") => TokenStoreKind::Keyring,
            Some("file") => TokenStoreKind::File,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SPOTIFY_CLEANER_TOKEN_STORE",
                    reason: format!("expected `keyring` or `file`, got `{other}`"),
                });
            }
        };

        let config = Config {
            client_id,
            client_secret: get("SPOTIFY_CLIENT_SECRET"),
            redirect_uri,
            scope: get("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.into()),
            auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.into()),
            token_url: get("SPOTIFY_API_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
            api_url: get("SPOTIFY_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.into())
                .trim_end_matches('/')
                .to_string(),
            callback_timeout: seconds(
                "SPOTIFY_CLEANER_CALLBACK_TIMEOUT",
                get("SPOTIFY_CLEANER_CALLBACK_TIMEOUT"),
                DEFAULT_CALLBACK_TIMEOUT_SECS,
            )?,
            token_store,
            max_retry_after: seconds(
                "SPOTIFY_CLEANER_MAX_RETRY_AFTER",
                get("SPOTIFY_CLEANER_MAX_RETRY_AFTER"),
                DEFAULT_MAX_RETRY_AFTER_SECS,
            )?,
        };

        // Fail early rather than when the listener starts.
        config.callback_addr()?;
        Ok(config)
    }

    /// Loopback address the callback listener binds, taken from the redirect URI.
    pub fn callback_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            key: "SPOTIFY_REDIRECT_URI",
            reason: reason.to_string(),
        };

        let ip = match self.redirect_uri.host_str() {
            Some("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Some(host) => host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<IpAddr>()
                .map_err(|_| invalid("host must be localhost or a loopback address"))?,
            None => return Err(invalid("missing host")),
        };
        if !ip.is_loopback() {
            return Err(invalid("host must be a loopback address"));
        }

        let port = self
            .redirect_uri
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;

        Ok(SocketAddr::new(ip, port))
    }

    /// Path component the callback listener serves, e.g. `/callback`.
    pub fn callback_path(&self) -> String {
        self.redirect_uri.path().to_string()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retry_after: self.max_retry_after,
            ..RetryPolicy::default()
        }
    }
}

fn seconds(key: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(Duration::from_secs(default)),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
    }
}
