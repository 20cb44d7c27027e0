#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use spotify_cleaner::{
    error::{ApiError, AuthError},
    management::{AuthorizationPrompt, SecretStore, TokenProvider},
    server::CallbackListener,
    spotify::{auth::OAuthClient, playlists::PlaylistApi},
    types::{Credential, PlaylistPage, PlaylistRecord, UserProfile},
    utils::{Clock, Sleeper},
};

// Helper function to create a test playlist record
pub fn record(id: &str, name: &str, owner_id: &str) -> PlaylistRecord {
    PlaylistRecord {
        id: id.to_string(),
        name: name.to_string(),
        owner_id: owner_id.to_string(),
        owner_name: None,
        is_collaborative: false,
        is_public: Some(true),
        track_count: 10,
        description: Some("some songs".to_string()),
    }
}

pub fn page(items: Vec<PlaylistRecord>, has_next: bool, total: u32) -> PlaylistPage {
    PlaylistPage {
        slots: items.len() as u32,
        items,
        has_next,
        total,
    }
}

/// A page where the server sent `slots` entries, some of them `null`.
pub fn page_with_nulls(
    items: Vec<PlaylistRecord>,
    slots: u32,
    has_next: bool,
    total: u32,
) -> PlaylistPage {
    PlaylistPage {
        items,
        slots,
        has_next,
        total,
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn user(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        display_name: Some(format!("{id} display")),
        email: None,
        external_urls: Default::default(),
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

pub fn credential(access: &str, refresh: &str, expires_at: DateTime<Utc>) -> Credential {
    Credential {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at,
    }
}

/// Playlist API replaying scripted responses and recording every call.
#[derive(Default)]
pub struct ScriptedApi {
    pages: Mutex<VecDeque<Result<PlaylistPage, ApiError>>>,
    unfollows: Mutex<HashMap<String, VecDeque<Result<(), ApiError>>>>,
    users: Mutex<VecDeque<Result<UserProfile, ApiError>>>,
    pub page_calls: Mutex<Vec<(String, u32, u32)>>,
    pub unfollow_calls: Mutex<Vec<(String, String)>>,
    pub user_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, response: Result<PlaylistPage, ApiError>) -> &Self {
        self.pages.lock().unwrap().push_back(response);
        self
    }

    pub fn push_unfollow(&self, id: &str, response: Result<(), ApiError>) -> &Self {
        self.unfollows
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn push_user(&self, response: Result<UserProfile, ApiError>) -> &Self {
        self.users.lock().unwrap().push_back(response);
        self
    }

    pub fn offsets(&self) -> Vec<u32> {
        self.page_calls.lock().unwrap().iter().map(|c| c.1).collect()
    }

    pub fn unfollowed(&self) -> Vec<String> {
        self.unfollow_calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.1.clone())
            .collect()
    }
}

#[async_trait]
impl PlaylistApi for ScriptedApi {
    async fn playlists_page(
        &self,
        token: &str,
        offset: u32,
        limit: u32,
    ) -> Result<PlaylistPage, ApiError> {
        self.page_calls
            .lock()
            .unwrap()
            .push((token.to_string(), offset, limit));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PlaylistPage::default()))
    }

    async fn unfollow_playlist(&self, token: &str, playlist_id: &str) -> Result<(), ApiError> {
        self.unfollow_calls
            .lock()
            .unwrap()
            .push((token.to_string(), playlist_id.to_string()));
        self.unfollows
            .lock()
            .unwrap()
            .get_mut(playlist_id)
            .and_then(|q| q.pop_front())
            .unwrap_or(Ok(()))
    }

    async fn current_user(&self, _token: &str) -> Result<UserProfile, ApiError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(user("me")))
    }
}

/// Records requested delays instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Hands out `tokens[n]`, where `n` is the number of recoveries so far.
pub struct FakeTokens {
    tokens: Vec<String>,
    recovered: AtomicUsize,
    pub access_calls: AtomicUsize,
    access_error: Mutex<Option<AuthError>>,
    recover_error: Mutex<Option<AuthError>>,
}

impl FakeTokens {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: ids(tokens),
            recovered: AtomicUsize::new(0),
            access_calls: AtomicUsize::new(0),
            access_error: Mutex::new(None),
            recover_error: Mutex::new(None),
        }
    }

    pub fn fail_access(self, error: AuthError) -> Self {
        *self.access_error.lock().unwrap() = Some(error);
        self
    }

    pub fn fail_recover(self, error: AuthError) -> Self {
        *self.recover_error.lock().unwrap() = Some(error);
        self
    }

    pub fn recoveries(&self) -> usize {
        self.recovered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for FakeTokens {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.access_error.lock().unwrap().clone() {
            return Err(e);
        }
        let index = self.recovered.load(Ordering::SeqCst).min(self.tokens.len() - 1);
        Ok(self.tokens[index].clone())
    }

    async fn recover(&self) -> Result<(), AuthError> {
        if let Some(e) = self.recover_error.lock().unwrap().clone() {
            return Err(e);
        }
        self.recovered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Token endpoint replaying scripted credentials.
#[derive(Default)]
pub struct ScriptedOAuth {
    exchanges: Mutex<VecDeque<Result<Credential, AuthError>>>,
    refreshes: Mutex<VecDeque<Result<Credential, AuthError>>>,
    pub exchange_calls: Mutex<Vec<(String, String)>>,
    pub refresh_calls: Mutex<Vec<String>>,
    pub authorize_calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedOAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_exchange(&self, response: Result<Credential, AuthError>) -> &Self {
        self.exchanges.lock().unwrap().push_back(response);
        self
    }

    pub fn push_refresh(&self, response: Result<Credential, AuthError>) -> &Self {
        self.refreshes.lock().unwrap().push_back(response);
        self
    }

    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.lock().unwrap().len()
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OAuthClient for ScriptedOAuth {
    fn authorize_url(&self, code_challenge: &str, state: &str) -> String {
        self.authorize_calls
            .lock()
            .unwrap()
            .push((code_challenge.to_string(), state.to_string()));
        format!("https://accounts.example/authorize?state={state}&code_challenge={code_challenge}")
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        _now: DateTime<Utc>,
    ) -> Result<Credential, AuthError> {
        self.exchange_calls
            .lock()
            .unwrap()
            .push((code.to_string(), code_verifier.to_string()));
        self.exchanges.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(AuthError::TokenExchangeFailed("no scripted exchange".to_string()))
        })
    }

    async fn refresh(
        &self,
        refresh_token: &str,
        _now: DateTime<Utc>,
    ) -> Result<Credential, AuthError> {
        self.refresh_calls
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        self.refreshes.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(AuthError::TokenExchangeFailed("no scripted refresh".to_string()))
        })
    }
}

/// Callback listener that answers immediately with scripted results.
#[derive(Default)]
pub struct ScriptedListener {
    results: Mutex<VecDeque<Result<String, AuthError>>>,
    pub calls: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<String, AuthError>) -> &Self {
        self.results.lock().unwrap().push_back(result);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CallbackListener for ScriptedListener {
    async fn wait_for_code(
        &self,
        expected_state: &str,
        timeout: Duration,
    ) -> Result<String, AuthError> {
        self.calls
            .lock()
            .unwrap()
            .push((expected_state.to_string(), timeout));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AuthError::CallbackTimeout(timeout.as_secs())))
    }
}

#[derive(Default)]
pub struct RecordingPrompt {
    pub urls: Mutex<Vec<String>>,
}

impl AuthorizationPrompt for RecordingPrompt {
    fn open(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

/// Secret store whose backend is unreachable.
pub struct BrokenStore;

#[async_trait]
impl SecretStore for BrokenStore {
    async fn get(&self, _service: &str, _account: &str) -> Result<Option<Vec<u8>>, AuthError> {
        Err(AuthError::StoreUnavailable("keychain locked".to_string()))
    }

    async fn set(&self, _service: &str, _account: &str, _secret: &[u8]) -> Result<(), AuthError> {
        Err(AuthError::StoreUnavailable("keychain locked".to_string()))
    }

    async fn delete(&self, _service: &str, _account: &str) -> Result<(), AuthError> {
        Err(AuthError::StoreUnavailable("keychain locked".to_string()))
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
