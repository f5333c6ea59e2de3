use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetcher::ContentStore;
use crate::generation::GenerationRecord;
use crate::model::PostPage;
use crate::revalidation::RevalidationPolicy;

/// The generated first listing page, revalidated like post pages.
#[derive(Clone)]
pub struct ListingCache {
    store: Arc<dyn ContentStore>,
    page: Arc<RwLock<Option<GenerationRecord<PostPage>>>>,
    refreshing: Arc<AtomicBool>,
    policy: RevalidationPolicy,
}

impl ListingCache {
    pub fn new(store: Arc<dyn ContentStore>, policy: RevalidationPolicy) -> Self {
        Self {
            store,
            page: Arc::new(RwLock::new(None)),
            refreshing: Arc::new(AtomicBool::new(false)),
            policy,
        }
    }

    /// Fetches the first page and replaces the cached one.
    pub async fn regenerate(&self) -> Result<Arc<PostPage>, FetchError> {
        let page = Arc::new(self.store.list_posts(None).await?);
        *self.page.write().await = Some(GenerationRecord::Built {
            value: page.clone(),
            generated_at: Utc::now(),
        });
        info!(posts = page.results.len(), more = page.next_page_url.is_some(), "generated listing page");
        Ok(page)
    }

    pub async fn get(&self) -> Result<Arc<PostPage>, FetchError> {
        self.get_at(Utc::now()).await
    }

    /// Cached page, generated inline on first use. A stale page is returned
    /// as-is while one background refresh runs.
    pub async fn get_at(&self, now: DateTime<Utc>) -> Result<Arc<PostPage>, FetchError> {
        let cached = self.page.read().await.clone();
        match cached {
            Some(GenerationRecord::Built {
                value,
                generated_at,
            }) => {
                if self.policy.is_stale(generated_at, now) {
                    self.spawn_refresh();
                }
                Ok(value)
            }
            _ => self.regenerate().await,
        }
    }

    fn spawn_refresh(&self) {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("listing page is stale, revalidating");
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.regenerate().await {
                warn!(error = %err, "listing regeneration failed, keeping stale page");
            }
            this.refreshing.store(false, Ordering::Release);
        });
    }
}
