use std::sync::Arc;

use crate::{
    error::{ApiError, BatchInterrupted, Error},
    management::auth::TokenProvider,
    retry::{self, Attempt, RetryPolicy},
    spotify::playlists::PlaylistApi,
    types::{MutationOutcome, MutationStatus},
    utils::Sleeper,
};

/// Unfollows playlists one at a time, in the order given.
pub struct MutationExecutor {
    api: Arc<dyn PlaylistApi>,
    tokens: Arc<dyn TokenProvider>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl MutationExecutor {
    pub fn new(
        api: Arc<dyn PlaylistApi>,
        tokens: Arc<dyn TokenProvider>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            tokens,
            sleeper,
            policy,
        }
    }

    pub async fn unfollow(
        &self,
        ids: &[String],
        dry_run: bool,
    ) -> Result<Vec<MutationOutcome>, BatchInterrupted> {
        self.unfollow_with(ids, dry_run, |_| {}).await
    }

    /// Processes `ids` in order and reports every outcome to `on_outcome`.
    ///
    /// A failure on one playlist is recorded and the batch continues. A 401,
    /// or failing to obtain a token, stops the batch; the error carries the
    /// outcomes so far and the ids not yet attempted.
    pub async fn unfollow_with<F>(
        &self,
        ids: &[String],
        dry_run: bool,
        mut on_outcome: F,
    ) -> Result<Vec<MutationOutcome>, BatchInterrupted>
    where
        F: FnMut(&MutationOutcome),
    {
        let mut outcomes = Vec::with_capacity(ids.len());

        if dry_run {
            for id in ids {
                let outcome = MutationOutcome::simulated(id.as_str());
                on_outcome(&outcome);
                outcomes.push(outcome);
            }
            return Ok(outcomes);
        }

        for (index, id) in ids.iter().enumerate() {
            let interrupt = |source: Error, completed: Vec<MutationOutcome>| BatchInterrupted {
                source: Box::new(source),
                completed,
                remaining: ids[index..].to_vec(),
            };

            let token = match self.tokens.access_token().await {
                Ok(token) => token,
                Err(e) => return Err(interrupt(e.into(), outcomes)),
            };

            let outcome = match self.unfollow_one(&token, id).await {
                Ok(outcome) => outcome,
                Err(ApiError::Unauthorized) => {
                    tracing::warn!(playlist_id = %id, "access token rejected, stopping batch");
                    return Err(interrupt(ApiError::Unauthorized.into(), outcomes));
                }
                Err(e) => {
                    tracing::warn!(playlist_id = %id, error = %e, "unfollow failed");
                    MutationOutcome::failed(id.as_str(), e.to_string())
                }
            };

            tracing::debug!(playlist_id = %id, status = %outcome.status, "unfollow processed");
            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn unfollow_one(&self, token: &str, id: &str) -> Result<MutationOutcome, ApiError> {
        let ((), stats) = retry::run(&self.policy, self.sleeper.as_ref(), || {
            let api = Arc::clone(&self.api);
            async move { api.unfollow_playlist(token, id).await.map_err(Attempt::from) }
        })
        .await?;

        let status = if stats.rate_limited > 0 {
            MutationStatus::RateLimitedRetry
        } else {
            MutationStatus::Success
        };
        Ok(MutationOutcome {
            playlist_id: id.to_string(),
            status,
            error_detail: None,
        })
    }
}
