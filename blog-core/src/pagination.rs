//! Incremental "load more" over the listing endpoint.
//!
//! [`merge`] is the pure append step. [`ListingSession`] owns the client-side
//! state for one listing view, allows one fetch in flight at a time and drops
//! responses that arrive after the view was reset or closed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::fetcher::ContentStore;
use crate::model::{PostPage, PostSummary};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationState {
    pub loaded_posts: Vec<PostSummary>,
    pub next_page_url: Option<String>,
}

impl PaginationState {
    pub fn from_first_page(page: PostPage) -> Self {
        Self {
            loaded_posts: page.results,
            next_page_url: page.next_page_url,
        }
    }

    /// Whether the "load more" control is shown.
    pub fn has_more(&self) -> bool {
        self.next_page_url.is_some()
    }
}

/// Appends `fetched.results` in order and adopts its `next_page` marker.
pub fn merge(state: PaginationState, fetched: PostPage) -> PaginationState {
    let mut loaded_posts = state.loaded_posts;
    loaded_posts.extend(fetched.results);
    PaginationState {
        loaded_posts,
        next_page_url: fetched.next_page_url,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { appended: usize },
    /// No next page; nothing was fetched.
    Exhausted,
    /// Another load is still running for this session.
    Busy,
    /// Fetch failed; state untouched, caller may retry.
    Failed,
    /// The session was reset or closed while the fetch was in flight.
    Discarded,
}

#[derive(Debug, Default)]
pub struct ListingSession {
    state: RwLock<PaginationState>,
    in_flight: AtomicBool,
    epoch: AtomicU64,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ListingSession {
    pub fn new(first_page: PostPage) -> Self {
        Self {
            state: RwLock::new(PaginationState::from_first_page(first_page)),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> PaginationState {
        self.state.read().await.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.state.read().await.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetches the page at the current `next_page_url` and merges it.
    pub async fn load_more(&self, store: &dyn ContentStore) -> LoadOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("load more ignored, a fetch is already in flight");
            return LoadOutcome::Busy;
        }
        let _latch = InFlight(&self.in_flight);

        let (epoch, target) = {
            let state = self.state.read().await;
            // reset/close bump the epoch under the write lock
            let epoch = self.epoch.load(Ordering::Acquire);
            match state.next_page_url.clone() {
                Some(url) => (epoch, url),
                None => return LoadOutcome::Exhausted,
            }
        };

        let page = match store.fetch_page(&target).await {
            Ok(page) => page,
            Err(err) => {
                warn!(url = %target, error = %err, "failed to load more posts");
                return LoadOutcome::Failed;
            }
        };

        let mut state = self.state.write().await;
        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!(url = %target, "listing session changed during fetch, page dropped");
            return LoadOutcome::Discarded;
        }
        let appended = page.results.len();
        let current = std::mem::take(&mut *state);
        *state = merge(current, page);
        debug!(appended, total = state.loaded_posts.len(), "merged listing page");
        LoadOutcome::Loaded { appended }
    }

    /// Replaces the whole state, e.g. after the listing was regenerated.
    pub async fn reset(&self, first_page: PostPage) {
        let mut state = self.state.write().await;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        *state = PaginationState::from_first_page(first_page);
    }

    /// Tears the session down; in-flight responses are discarded.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        *state = PaginationState::default();
    }
}
