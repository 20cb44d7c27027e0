use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// OAuth credential as persisted in the secret store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// True when fewer than `margin` seconds of lifetime remain at `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at - margin <= now
    }
}

/// Token endpoint response for both grant types.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Snapshot of one playlist in the user's library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRecord {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub owner_name: Option<String>,
    pub is_collaborative: bool,
    pub is_public: Option<bool>,
    pub track_count: u32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    #[serde(default)]
    pub total: u32,
}

/// Simplified playlist object as returned by `GET /me/playlists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tracks: PlaylistTracksRef,
}

impl From<Playlist> for PlaylistRecord {
    fn from(p: Playlist) -> Self {
        PlaylistRecord {
            id: p.id,
            name: p.name,
            owner_id: p.owner.id,
            owner_name: p.owner.display_name,
            is_collaborative: p.collaborative,
            is_public: p.public,
            track_count: p.tracks.total,
            description: p.description.filter(|d| !d.is_empty()),
        }
    }
}

/// One page of `GET /me/playlists`. The API may place `null` in `items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserPlaylistsResponse {
    pub items: Vec<Option<Playlist>>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: u32,
}

/// Decoded page handed to the fetcher.
///
/// `slots` counts every entry the server returned, `null` ones included,
/// so the next offset stays aligned with the server's numbering.
#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistRecord>,
    pub slots: u32,
    pub has_next: bool,
    pub total: u32,
}

impl From<GetUserPlaylistsResponse> for PlaylistPage {
    fn from(res: GetUserPlaylistsResponse) -> Self {
        PlaylistPage {
            slots: res.items.len() as u32,
            items: res.items.into_iter().flatten().map(Into::into).collect(),
            has_next: res.next.is_some(),
            total: res.total,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Success,
    /// Succeeded after waiting out one or more 429 responses.
    RateLimitedRetry,
    Failed,
    /// Dry run; nothing was sent.
    Simulated,
}

impl std::fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MutationStatus::Success => "success",
            MutationStatus::RateLimitedRetry => "success (after rate limit)",
            MutationStatus::Failed => "failed",
            MutationStatus::Simulated => "dry run",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub playlist_id: String,
    pub status: MutationStatus,
    pub error_detail: Option<String>,
}

impl MutationOutcome {
    pub fn success(playlist_id: impl Into<String>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            status: MutationStatus::Success,
            error_detail: None,
        }
    }

    pub fn simulated(playlist_id: impl Into<String>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            status: MutationStatus::Simulated,
            error_detail: None,
        }
    }

    pub fn failed(playlist_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            status: MutationStatus::Failed,
            error_detail: Some(detail.into()),
        }
    }

    /// True only for a real, completed removal.
    pub fn is_removed(&self) -> bool {
        matches!(
            self.status,
            MutationStatus::Success | MutationStatus::RateLimitedRetry
        )
    }
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub id: String,
    pub owner: String,
    pub tracks: u32,
    pub collaborative: String,
    pub public: String,
}

impl From<&PlaylistRecord> for PlaylistTableRow {
    fn from(p: &PlaylistRecord) -> Self {
        let flag = |b: bool| if b { "yes" } else { "no" }.to_string();
        PlaylistTableRow {
            name: p.name.clone(),
            id: p.id.clone(),
            owner: p.owner_name.clone().unwrap_or_else(|| p.owner_id.clone()),
            tracks: p.track_count,
            collaborative: flag(p.is_collaborative),
            public: p.is_public.map(flag).unwrap_or_else(|| "n/a".to_string()),
        }
    }
}

#[derive(Tabled)]
pub struct OutcomeTableRow {
    pub id: String,
    pub status: String,
    pub detail: String,
}

impl From<&MutationOutcome> for OutcomeTableRow {
    fn from(o: &MutationOutcome) -> Self {
        OutcomeTableRow {
            id: o.playlist_id.clone(),
            status: o.status.to_string(),
            detail: o.error_detail.clone().unwrap_or_default(),
        }
    }
}
