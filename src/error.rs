//! Error types for the playlist cleaner.
//!
//! Each component owns a small error enum; [`Error`] wraps them for callers
//! that drive several components at once.

use crate::types::MutationOutcome;

/// Failures while obtaining or persisting OAuth credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No redirect reached the callback listener before the timeout.
    #[error("timed out after {0} seconds waiting for the authorization callback")]
    CallbackTimeout(u64),

    /// The token endpoint rejected the authorization code or refresh token.
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The OS secret store could not be read or written.
    #[error("secret store unavailable: {0}")]
    StoreUnavailable(String),

    /// The user declined the authorization request.
    #[error("authorization was denied: {0}")]
    AuthorizationDenied(String),

    /// The callback listener could not bind its loopback address.
    #[error("cannot start callback listener: {0}")]
    CallbackBind(String),

    /// The token endpoint could not be reached.
    #[error("network error while talking to the token endpoint: {0}")]
    Network(String),

    /// The token endpoint answered with something that is not a token.
    #[error("unexpected token endpoint response: {0}")]
    InvalidResponse(String),
}

/// Failures reported by the Spotify Web API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 401: the access token is missing, expired or revoked.
    #[error("unauthorized: the access token was rejected")]
    Unauthorized,

    /// 429 that could not be waited out.
    #[error("rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// 5xx or a network failure; `status` is `None` for the latter.
    #[error("transient failure{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Any other non-success status.
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("cannot decode response: {0}")]
    Decode(String),

    /// The configured API base cannot carry a path.
    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transient {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

/// Invalid filter input, reported before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid name pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("cannot load environment file {path}: {reason}")]
    EnvFile { path: String, reason: String },
}

/// A mutation batch stopped before every id was processed.
///
/// `completed` holds the outcomes produced so far and `remaining` the ids that
/// were not attempted, starting with the one that hit the error.
#[derive(Debug, thiserror::Error)]
#[error(
    "unfollow stopped after {} of {} playlists: {source}",
    .completed.len(),
    .completed.len() + .remaining.len()
)]
pub struct BatchInterrupted {
    pub source: Box<Error>,
    pub completed: Vec<MutationOutcome>,
    pub remaining: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Interrupted(#[from] BatchInterrupted),
}

impl Error {
    /// True when the platform rejected the access token.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Api(ApiError::Unauthorized) => true,
            Error::Interrupted(b) => b.source.is_unauthorized(),
            _ => false,
        }
    }
}
