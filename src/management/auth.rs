use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::AuthError,
    info,
    management::store::TokenStore,
    server::CallbackListener,
    spotify::auth::OAuthClient,
    types::Credential,
    utils::{self, Clock},
    warning,
};

/// Remaining lifetime below which a credential is refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Supplies bearer tokens to the fetcher and the mutation executor.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Called once after the API rejected the current token.
    async fn recover(&self) -> Result<(), AuthError>;
}

/// Shows the authorization URL to the user.
pub trait AuthorizationPrompt: Send + Sync {
    fn open(&self, url: &str);
}

/// Opens the default browser and prints the URL as a fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserPrompt;

impl AuthorizationPrompt for BrowserPrompt {
    fn open(&self, url: &str) {
        info!("Your browser should open to authorize spotify-cleaner.");
        if webbrowser::open(url).is_err() {
            warning!("Failed to open browser. Please navigate to the following URL manually:\n{}", url);
        } else {
            info!("If it doesn't, open this URL manually:\n{}", url);
        }
    }
}

/// Owns the credential lifecycle: load, refresh, full authorization, persist.
pub struct AuthManager {
    store: TokenStore,
    oauth: Arc<dyn OAuthClient>,
    listener: Arc<dyn CallbackListener>,
    prompt: Arc<dyn AuthorizationPrompt>,
    clock: Arc<dyn Clock>,
    callback_timeout: Duration,
    current: Mutex<Option<Credential>>,
}

impl AuthManager {
    pub fn new(
        store: TokenStore,
        oauth: Arc<dyn OAuthClient>,
        listener: Arc<dyn CallbackListener>,
        prompt: Arc<dyn AuthorizationPrompt>,
        clock: Arc<dyn Clock>,
        callback_timeout: Duration,
    ) -> Self {
        Self {
            store,
            oauth,
            listener,
            prompt,
            clock,
            callback_timeout,
            current: Mutex::new(None),
        }
    }

    /// Returns a credential that is valid for at least the refresh margin.
    ///
    /// With `force_reauth` the stored credential is ignored and the browser
    /// flow runs unconditionally. A rejected refresh token falls back to the
    /// browser flow once; a failure there is returned.
    pub async fn get_valid_token(&self, force_reauth: bool) -> Result<Credential, AuthError> {
        let mut current = self.current.lock().await;

        if force_reauth {
            tracing::info!("re-authorization forced");
            let credential = self.authorize().await?;
            *current = Some(credential.clone());
            return Ok(credential);
        }

        let known = match current.take() {
            Some(c) => Some(c),
            None => self.store.load().await?,
        };

        let credential = match known {
            None => {
                tracing::info!("no stored credential, starting authorization");
                self.authorize().await?
            }
            Some(c) if !self.is_expiring(&c) => c,
            Some(c) => {
                tracing::debug!(expires_at = %c.expires_at, "access token expiring, refreshing");
                self.refresh_or_authorize(&c).await?
            }
        };

        *current = Some(credential.clone());
        Ok(credential)
    }

    /// Replaces a credential the API rejected even though it looked valid.
    pub async fn reauthenticate(&self) -> Result<Credential, AuthError> {
        let mut current = self.current.lock().await;

        let known = match current.take() {
            Some(c) => Some(c),
            None => self.store.load().await?,
        };
        let credential = match known {
            Some(c) => self.refresh_or_authorize(&c).await?,
            None => self.authorize().await?,
        };

        *current = Some(credential.clone());
        Ok(credential)
    }

    /// Forgets the credential here and in the secret store.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.current.lock().await.take();
        self.store.clear().await
    }

    fn is_expiring(&self, credential: &Credential) -> bool {
        credential.expires_within(
            self.clock.now(),
            chrono::Duration::seconds(REFRESH_MARGIN_SECS),
        )
    }

    async fn refresh_or_authorize(&self, stale: &Credential) -> Result<Credential, AuthError> {
        match self.refresh(stale).await {
            Err(AuthError::TokenExchangeFailed(reason)) => {
                tracing::warn!(%reason, "refresh token rejected, falling back to authorization");
                self.authorize().await
            }
            other => other,
        }
    }

    async fn refresh(&self, stale: &Credential) -> Result<Credential, AuthError> {
        let mut fresh = self
            .oauth
            .refresh(&stale.refresh_token, self.clock.now())
            .await?;
        if fresh.refresh_token.is_empty() {
            fresh.refresh_token = stale.refresh_token.clone();
        }

        self.store.save(&fresh).await?;
        tracing::info!(expires_at = %fresh.expires_at, "access token refreshed");
        Ok(fresh)
    }

    async fn authorize(&self) -> Result<Credential, AuthError> {
        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);
        let state = utils::generate_state();

        let url = self.oauth.authorize_url(&code_challenge, &state);
        self.prompt.open(&url);

        let code = self
            .listener
            .wait_for_code(&state, self.callback_timeout)
            .await?;
        let credential = self
            .oauth
            .exchange_code(&code, &code_verifier, self.clock.now())
            .await?;

        self.store.save(&credential).await?;
        tracing::info!("authorization completed");
        Ok(credential)
    }
}

#[async_trait]
impl TokenProvider for AuthManager {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.get_valid_token(false).await?.access_token)
    }

    async fn recover(&self) -> Result<(), AuthError> {
        self.reauthenticate().await.map(|_| ())
    }
}
