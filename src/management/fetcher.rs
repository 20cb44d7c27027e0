use std::sync::Arc;

use crate::{
    Res,
    management::auth::TokenProvider,
    retry::{self, Attempt, RetryPolicy},
    spotify::playlists::{MAX_PAGE_SIZE, PlaylistApi},
    types::{PlaylistPage, PlaylistRecord},
    utils::Sleeper,
};

/// Walks every page of the user's playlist collection.
pub struct PlaylistFetcher {
    api: Arc<dyn PlaylistApi>,
    tokens: Arc<dyn TokenProvider>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    page_size: u32,
}

impl PlaylistFetcher {
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
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub async fn fetch_all(&self) -> Res<Vec<PlaylistRecord>> {
        self.fetch_all_with(|_| {}).await
    }

    /// Like [`fetch_all`](Self::fetch_all), reporting the running count after each page.
    ///
    /// The offset advances by the number of slots the server returned, so
    /// `null` entries are skipped without shifting later pages. Stops at the
    /// first page with no slots or without a `next` reference. A 429 repeats
    /// the same page; a 401 is returned at once.
    pub async fn fetch_all_with<F>(&self, mut on_page: F) -> Res<Vec<PlaylistRecord>>
    where
        F: FnMut(usize),
    {
        let mut all_playlists: Vec<PlaylistRecord> = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self.fetch_page(offset, self.page_size).await?;
            if page.slots == 0 {
                break;
            }

            offset = offset.saturating_add(page.slots);
            if !page.items.is_empty() {
                all_playlists.extend(page.items);
                on_page(all_playlists.len());
            }
            tracing::debug!(fetched = all_playlists.len(), total = page.total, "playlist page received");

            if !page.has_next {
                break;
            }
        }

        tracing::info!(count = all_playlists.len(), "fetched playlists");
        Ok(all_playlists)
    }

    /// One page with the retry policy applied.
    pub async fn fetch_page(&self, offset: u32, limit: u32) -> Res<PlaylistPage> {
        let token = self.tokens.access_token().await?;

        let (page, stats) = retry::run(&self.policy, self.sleeper.as_ref(), || {
            let api = Arc::clone(&self.api);
            let token = token.clone();
            async move {
                api.playlists_page(&token, offset, limit)
                    .await
                    .map_err(Attempt::from)
            }
        })
        .await?;

        if stats.rate_limited > 0 {
            tracing::debug!(offset, waits = stats.rate_limited, "page fetched after rate limiting");
        }
        Ok(page)
    }
}
