use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Url};

use crate::{
    config::Config,
    error::AuthError,
    types::{Credential, TokenErrorResponse, TokenResponse},
};

/// Authorization-code and refresh-token exchanges against the token endpoint.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// URL the user opens to grant access.
    fn authorize_url(&self, code_challenge: &str, state: &str) -> String;

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        now: DateTime<Utc>,
    ) -> Result<Credential, AuthError>;

    /// The returned credential has an empty `refresh_token` when the platform
    /// did not rotate it.
    async fn refresh(&self, refresh_token: &str, now: DateTime<Utc>)
    -> Result<Credential, AuthError>;
}

/// Spotify Accounts service client.
#[derive(Debug, Clone)]
pub struct SpotifyOAuthClient {
    http: Client,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    scope: String,
    auth_url: String,
    token_url: String,
}

impl SpotifyOAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.to_string(),
            scope: config.scope.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
        }
    }

    fn token_request(&self, form: &[(&str, &str)]) -> RequestBuilder {
        let request = self.http.post(&self.token_url).form(form);
        match &self.client_secret {
            Some(secret) => request.basic_auth(&self.client_id, Some(secret)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, now: DateTime<Utc>) -> Result<Credential, AuthError> {
        let res = request
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if status.is_client_error() {
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{} ({})", err.error, desc),
                    None => err.error,
                },
                Err(_) => format!("status {status}"),
            };
            return Err(AuthError::TokenExchangeFailed(reason));
        }
        if !status.is_success() {
            return Err(AuthError::Network(format!("token endpoint returned {status}")));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Ok(Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token.unwrap_or_default(),
            expires_at: now + chrono::Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl OAuthClient for SpotifyOAuthClient {
    fn authorize_url(&self, code_challenge: &str, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", self.scope.as_str()),
            ("state", state),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
        ];
        match Url::parse_with_params(&self.auth_url, &params) {
            Ok(url) => url.to_string(),
            // auth_url is not a valid base; hand it back with a plain query.
            Err(_) => {
                let query = params
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&");
                format!("{}?{}", self.auth_url, query)
            }
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        now: DateTime<Utc>,
    ) -> Result<Credential, AuthError> {
        let request = self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
            ("client_id", &self.client_id),
            ("code_verifier", code_verifier),
        ]);
        let credential = self.send(request, now).await?;
        if credential.refresh_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "authorization response carried no refresh token".to_string(),
            ));
        }
        Ok(credential)
    }

    async fn refresh(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Credential, AuthError> {
        let request = self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.client_id),
        ]);
        self.send(request, now).await
    }
}
