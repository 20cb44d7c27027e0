use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    Res,
    config::{Config, TokenStoreKind, data_dir},
    error::{BatchInterrupted, Error},
    management::{
        auth::{AuthManager, BrowserPrompt, TokenProvider},
        fetcher::PlaylistFetcher,
        filter::{self, Criteria},
        mutation::MutationExecutor,
        store::{FileSecretStore, KeyringSecretStore, SecretStore, TokenStore},
    },
    retry::{self, Attempt, RetryPolicy},
    server::LoopbackListener,
    spotify::{
        auth::SpotifyOAuthClient,
        playlists::{HttpSpotifyClient, PlaylistApi},
    },
    types::{MutationOutcome, PlaylistPage, PlaylistRecord, UserProfile},
    utils::{Sleeper, SystemClock, TokioSleeper},
};

/// Entry point for the command layer.
///
/// A 401 from the Web API triggers one credential recovery (refresh, then
/// the browser flow if the refresh token is rejected) and one more try; a
/// second 401 is returned to the caller.
pub struct PlaylistCleaner {
    api: Arc<dyn PlaylistApi>,
    tokens: Arc<dyn TokenProvider>,
    auth: Option<Arc<AuthManager>>,
    fetcher: PlaylistFetcher,
    executor: MutationExecutor,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    user: Mutex<Option<UserProfile>>,
}

impl PlaylistCleaner {
    pub fn new(
        api: Arc<dyn PlaylistApi>,
        tokens: Arc<dyn TokenProvider>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        let fetcher = PlaylistFetcher::new(
            Arc::clone(&api),
            Arc::clone(&tokens),
            Arc::clone(&sleeper),
            policy.clone(),
        );
        let executor = MutationExecutor::new(
            Arc::clone(&api),
            Arc::clone(&tokens),
            Arc::clone(&sleeper),
            policy.clone(),
        );

        Self {
            api,
            tokens,
            auth: None,
            fetcher,
            executor,
            sleeper,
            policy,
            user: Mutex::new(None),
        }
    }

    /// Wires the real Spotify clients, the configured secret store and the
    /// loopback callback listener.
    pub fn from_config(config: Config) -> Res<Self> {
        let secrets: Arc<dyn SecretStore> = match config.token_store {
            TokenStoreKind::Keyring => Arc::new(KeyringSecretStore),
            TokenStoreKind::File => Arc::new(FileSecretStore::new(data_dir())),
        };
        let auth = Arc::new(AuthManager::new(
            TokenStore::new(secrets),
            Arc::new(SpotifyOAuthClient::new(&config)),
            Arc::new(LoopbackListener::from_config(&config)?),
            Arc::new(BrowserPrompt),
            Arc::new(SystemClock),
            config.callback_timeout,
        ));

        let mut cleaner = Self::new(
            Arc::new(HttpSpotifyClient::from_config(&config)),
            Arc::clone(&auth) as Arc<dyn TokenProvider>,
            Arc::new(TokioSleeper),
            config.retry_policy(),
        );
        cleaner.auth = Some(auth);
        Ok(cleaner)
    }

    /// Resolves credentials up front, optionally forcing the browser flow.
    pub async fn authenticate(&self, force_reauth: bool) -> Res<()> {
        match &self.auth {
            Some(auth) => {
                auth.get_valid_token(force_reauth).await?;
            }
            None => {
                self.tokens.access_token().await?;
            }
        }
        Ok(())
    }

    /// Deletes the stored credential.
    pub async fn logout(&self) -> Res<()> {
        if let Some(auth) = &self.auth {
            auth.logout().await?;
        }
        Ok(())
    }

    /// Every playlist matching `criteria`, in API order.
    pub async fn list_playlists(&self, criteria: &Criteria) -> Res<Vec<PlaylistRecord>> {
        self.list_playlists_with(criteria, |_| {}).await
    }

    pub async fn list_playlists_with<F>(
        &self,
        criteria: &Criteria,
        mut on_page: F,
    ) -> Res<Vec<PlaylistRecord>>
    where
        F: FnMut(usize),
    {
        let criteria = self.resolve(criteria).await?;

        let playlists = match self.fetcher.fetch_all_with(&mut on_page).await {
            Err(e) if e.is_unauthorized() => {
                self.recover().await?;
                self.fetcher.fetch_all_with(&mut on_page).await?
            }
            other => other?,
        };

        Ok(filter::apply(playlists, &criteria))
    }

    /// What `execute_unfollow` would remove for `criteria`; no mutation.
    pub async fn preview_unfollow(&self, criteria: &Criteria) -> Res<Vec<PlaylistRecord>> {
        self.list_playlists(criteria).await
    }

    /// One API page, `page` counted from 1; `total` is the collection size.
    pub async fn list_page(&self, page: u32, limit: u32) -> Res<PlaylistPage> {
        let offset = page.saturating_sub(1).saturating_mul(limit);
        match self.fetcher.fetch_page(offset, limit).await {
            Err(e) if e.is_unauthorized() => {
                self.recover().await?;
                self.fetcher.fetch_page(offset, limit).await
            }
            other => other,
        }
    }

    pub async fn execute_unfollow(&self, ids: &[String], dry_run: bool) -> Res<Vec<MutationOutcome>> {
        self.execute_unfollow_with(ids, dry_run, |_| {}).await
    }

    /// Unfollows `ids` in order, resuming once after a 401.
    pub async fn execute_unfollow_with<F>(
        &self,
        ids: &[String],
        dry_run: bool,
        mut on_outcome: F,
    ) -> Res<Vec<MutationOutcome>>
    where
        F: FnMut(&MutationOutcome),
    {
        let mut outcomes = Vec::with_capacity(ids.len());
        let mut pending = ids.to_vec();
        let mut recovered = false;

        loop {
            let result = self
                .executor
                .unfollow_with(&pending, dry_run, &mut on_outcome)
                .await;
            match result {
                Ok(done) => {
                    outcomes.extend(done);
                    return Ok(outcomes);
                }
                Err(interrupted) if interrupted.source.is_unauthorized() && !recovered => {
                    recovered = true;
                    tracing::info!(
                        remaining = interrupted.remaining.len(),
                        "resuming unfollow after re-authentication"
                    );
                    outcomes.extend(interrupted.completed);
                    pending = interrupted.remaining;
                    if let Err(e) = self.recover().await {
                        return Err(BatchInterrupted {
                            source: Box::new(e),
                            completed: outcomes,
                            remaining: pending,
                        }
                        .into());
                    }
                }
                Err(mut interrupted) => {
                    outcomes.append(&mut interrupted.completed);
                    interrupted.completed = outcomes;
                    return Err(interrupted.into());
                }
            }
        }
    }

    /// Profile of the authenticated user; proves the credential works.
    pub async fn test_auth(&self) -> Res<UserProfile> {
        self.current_user().await
    }

    async fn current_user(&self) -> Res<UserProfile> {
        let mut cached = self.user.lock().await;
        if let Some(user) = cached.as_ref() {
            return Ok(user.clone());
        }

        let user = match self.fetch_current_user().await {
            Err(e) if e.is_unauthorized() => {
                self.recover().await?;
                self.fetch_current_user().await?
            }
            other => other?,
        };
        *cached = Some(user.clone());
        Ok(user)
    }

    async fn fetch_current_user(&self) -> Res<UserProfile> {
        let token = self.tokens.access_token().await?;
        let (user, _) = retry::run(&self.policy, self.sleeper.as_ref(), || {
            let api = Arc::clone(&self.api);
            let token = token.clone();
            async move { api.current_user(&token).await.map_err(Attempt::from) }
        })
        .await?;
        Ok(user)
    }

    async fn resolve(&self, criteria: &Criteria) -> Res<Criteria> {
        if !criteria.needs_user_id() {
            return Ok(criteria.clone());
        }
        let user = self.current_user().await?;
        tracing::debug!(user_id = %user.id, "resolved current user for owner filter");
        Ok(criteria.clone().with_user_id(user.id))
    }

    async fn recover(&self) -> Res<()> {
        tracing::warn!("access token rejected, re-authenticating");
        self.tokens.recover().await.map_err(Error::from)
    }
}
