use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};

use crate::{
    config::Config,
    error::ApiError,
    retry::parse_retry_after,
    types::{ApiErrorBody, GetUserPlaylistsResponse, PlaylistPage, UserProfile},
};

/// Maximum page size accepted by `GET /me/playlists`.
pub const MAX_PAGE_SIZE: u32 = 50;

/// The three Web API operations the cleaner needs.
///
/// Implementations report each response as-is; retrying is the caller's job.
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    async fn playlists_page(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<PlaylistPage, ApiError>;

    async fn unfollow_playlist(&self, token: &str, playlist_id: &str) -> Result<(), ApiError>;

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpSpotifyClient {
    http: Client,
    api_url: String,
}

impl HttpSpotifyClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone())
    }

    /// Appends `segments` to the API base, percent-encoding each one so a
    /// caller-supplied ID can never change the endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl PlaylistApi for HttpSpotifyClient {
    async fn playlists_page(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<PlaylistPage, ApiError> {
        let mut api_url = self.endpoint(&["me", "playlists"])?;
        api_url
            .query_pairs_mut()
            .append_pair("limit", &limit.clamp(1, MAX_PAGE_SIZE).to_string())
            .append_pair("offset", &offset.to_string());

        let response = self.http.get(api_url).bearer_auth(token).send().await?;
        let res = check(response)
            .await?
            .json::<GetUserPlaylistsResponse>()
            .await?;

        Ok(res.into())
    }

    async fn unfollow_playlist(&self, token: &str, playlist_id: &str) -> Result<(), ApiError> {
        let api_url = self.endpoint(&["playlists", playlist_id, "followers"])?;

        let response = self.http.delete(api_url).bearer_auth(token).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        let api_url = self.endpoint(&["me"])?;

        let response = self.http.get(api_url).bearer_auth(token).send().await?;
        Ok(check(response).await?.json::<UserProfile>().await?)
    }
}

/// Maps non-success statuses onto [`ApiError`], keeping the platform message.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok());
        return Err(ApiError::RateLimited {
            retry_after_secs: parse_retry_after(retry_after).as_secs(),
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        s if s.is_server_error() => ApiError::Transient {
            status: Some(s.as_u16()),
            message,
        },
        s => ApiError::Status {
            status: s.as_u16(),
            message,
        },
    })
}
