//! # Spotify Integration Module
//!
//! HTTP clients for the two Spotify services the cleaner talks to:
//!
//! - [`auth`] - the Accounts service token endpoint (authorization-code and
//!   refresh-token grants, PKCE, optional client secret via HTTP Basic)
//! - [`playlists`] - the Web API operations: list a page of the user's
//!   playlists, unfollow a playlist, read the current user's profile
//!
//! Both sit behind traits ([`auth::OAuthClient`], [`playlists::PlaylistApi`])
//! so the orchestration in [`crate::management`] can be exercised with fakes.
//! Neither client retries; status codes are mapped onto
//! [`crate::error::AuthError`] / [`crate::error::ApiError`] and the retry
//! loop in [`crate::retry`] decides what happens next.
//!
//! ## API Coverage
//!
//! - `POST /api/token` - code and refresh-token exchange
//! - `GET /me/playlists` - offset-paginated playlist listing
//! - `DELETE /playlists/{id}/followers` - unfollow
//! - `GET /me` - current user profile

pub mod auth;
pub mod playlists;
