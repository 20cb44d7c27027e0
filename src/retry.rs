//! Retry handling for Web API requests.
//!
//! A request runs through a small state machine:
//!
//! ```text
//! Fetching ──429──▶ Backoff(Retry-After) ──▶ Fetching
//!    │ ──5xx──▶ Backoff(base * 2^n) ──▶ Fetching   (at most `max_transient_retries`)
//!    └──ok / other error──▶ done
//! ```
//!
//! Waiting goes through a [`Sleeper`] so tests observe the delays without
//! spending them.

use std::{future::Future, time::Duration};

use crate::{error::ApiError, utils::Sleeper};

/// Delay used when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_transient_retries: u32,
    pub transient_base_delay: Duration,
    /// Longest single `Retry-After` that is waited out.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_transient_retries: 3,
            transient_base_delay: Duration::from_secs(1),
            max_retry_after: Duration::from_secs(120),
        }
    }
}

/// How many waits a successful request needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub rate_limited: u32,
    pub transient: u32,
}

/// A failure classified for the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    RateLimited(Duration),
    Failed(ApiError),
}

impl From<ApiError> for Attempt {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::RateLimited { retry_after_secs } => {
                Attempt::RateLimited(Duration::from_secs(retry_after_secs))
            }
            other => Attempt::Failed(other),
        }
    }
}

#[derive(Debug)]
enum State {
    Fetching,
    Backoff(Duration),
}

/// Runs `op` until it succeeds, fails permanently, or the policy gives up.
///
/// `op` is re-invoked for the same logical request after every backoff, so
/// callers must make it idempotent with respect to their own bookkeeping.
pub async fn run<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<(T, RetryStats), ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Attempt>>,
{
    let mut stats = RetryStats::default();
    let mut state = State::Fetching;

    loop {
        state = match state {
            State::Fetching => match op().await {
                Ok(value) => return Ok((value, stats)),
                Err(Attempt::RateLimited(wait)) => {
                    if wait > policy.max_retry_after {
                        tracing::warn!(
                            retry_after = wait.as_secs(),
                            "Retry-After exceeds the configured ceiling, giving up"
                        );
                        return Err(ApiError::RateLimited {
                            retry_after_secs: wait.as_secs(),
                        });
                    }
                    stats.rate_limited += 1;
                    tracing::info!(retry_after = wait.as_secs(), "rate limited, backing off");
                    State::Backoff(wait)
                }
                Err(Attempt::Failed(e))
                    if e.is_transient() && stats.transient < policy.max_transient_retries =>
                {
                    let wait = policy.transient_base_delay * 2u32.pow(stats.transient);
                    stats.transient += 1;
                    tracing::warn!(
                        attempt = stats.transient,
                        delay_ms = wait.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    State::Backoff(wait)
                }
                Err(Attempt::Failed(e)) => return Err(e),
            },
            State::Backoff(wait) => {
                sleeper.sleep(wait).await;
                State::Fetching
            }
        };
    }
}

/// Parses a numeric-seconds `Retry-After` value.
pub fn parse_retry_after(value: Option<&str>) -> Duration {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}
