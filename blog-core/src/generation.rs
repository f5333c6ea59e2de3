//! Per-slug page generation with fallback and stale-while-revalidate.
//!
//! A slug moves `NotGenerated -> Generating -> Generated`, or to `NotFound`
//! when the content store does not know it. `NotFound` is absorbing.
//! `Generated` pages past the revalidation window are still served while a
//! background task replaces them; concurrent requests may each start one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::LookupError;
use crate::fetcher::ContentStore;
use crate::model::PostRecord;
use crate::planner::Fallback;
use crate::revalidation::RevalidationPolicy;

#[derive(Debug, Clone)]
pub enum GenerationRecord<T> {
    Built {
        value: Arc<T>,
        generated_at: DateTime<Utc>,
    },
    Pending,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    NotGenerated,
    Generating,
    Generated,
    NotFound,
}

impl<T> GenerationRecord<T> {
    pub fn state(&self) -> PageState {
        match self {
            GenerationRecord::Built { .. } => PageState::Generated,
            GenerationRecord::Pending => PageState::Generating,
            GenerationRecord::Missing => PageState::NotFound,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageResponse {
    Page { post: Arc<PostRecord>, stale: bool },
    Placeholder,
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub generated: Vec<String>,
    pub not_found: Vec<String>,
    pub failed: Vec<String>,
}

type PageMap = HashMap<String, GenerationRecord<PostRecord>>;

#[derive(Clone)]
pub struct PostGenerator {
    store: Arc<dyn ContentStore>,
    pages: Arc<RwLock<PageMap>>,
    policy: RevalidationPolicy,
    fallback: Fallback,
}

impl PostGenerator {
    pub fn new(store: Arc<dyn ContentStore>, policy: RevalidationPolicy, fallback: Fallback) -> Self {
        Self {
            store,
            pages: Arc::new(RwLock::new(HashMap::new())),
            policy,
            fallback,
        }
    }

    pub async fn state(&self, slug: &str) -> PageState {
        self.pages
            .read()
            .await
            .get(slug)
            .map(GenerationRecord::state)
            .unwrap_or(PageState::NotGenerated)
    }

    pub async fn record(&self, slug: &str) -> Option<GenerationRecord<PostRecord>> {
        self.pages.read().await.get(slug).cloned()
    }

    /// Slugs with a built page, sorted.
    pub async fn built_slugs(&self) -> Vec<String> {
        let pages = self.pages.read().await;
        let mut slugs: Vec<String> = pages
            .iter()
            .filter(|(_, record)| matches!(record, GenerationRecord::Built { .. }))
            .map(|(slug, _)| slug.clone())
            .collect();
        slugs.sort();
        slugs
    }

    /// Looks the slug up and stores the outcome. Lookup misses and malformed
    /// records become `Missing`; transport failures keep whatever was there
    /// (a stale page) or return the slug to `NotGenerated`.
    pub async fn generate(&self, slug: &str) -> Result<Arc<PostRecord>, LookupError> {
        match self.store.get_post_by_slug(slug).await {
            Ok(post) => {
                let post = Arc::new(post);
                self.pages.write().await.insert(
                    slug.to_owned(),
                    GenerationRecord::Built {
                        value: post.clone(),
                        generated_at: Utc::now(),
                    },
                );
                info!(slug, "generated post page");
                Ok(post)
            }
            Err(err) if err.is_terminal() => {
                warn!(slug, error = %err, "post unavailable, marking not found");
                self.pages
                    .write()
                    .await
                    .insert(slug.to_owned(), GenerationRecord::Missing);
                Err(err)
            }
            Err(err) => {
                warn!(slug, error = %err, "post generation failed");
                let mut pages = self.pages.write().await;
                if matches!(pages.get(slug), Some(GenerationRecord::Pending)) {
                    pages.remove(slug);
                }
                Err(err)
            }
        }
    }

    /// Build-time generation over a bounded worker pool.
    pub async fn prebuild(&self, slugs: &[String], concurrency: usize) -> BuildReport {
        let results: Vec<(String, Result<Arc<PostRecord>, LookupError>)> = stream::iter(slugs)
            .map(|slug| async move { (slug.clone(), self.generate(slug).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut report = BuildReport::default();
        for (slug, result) in results {
            match result {
                Ok(_) => report.generated.push(slug),
                Err(err) if err.is_terminal() => report.not_found.push(slug),
                Err(_) => report.failed.push(slug),
            }
        }
        report.generated.sort();
        report.not_found.sort();
        report.failed.sort();
        info!(
            generated = report.generated.len(),
            not_found = report.not_found.len(),
            failed = report.failed.len(),
            "prebuilt post pages"
        );
        report
    }

    pub fn spawn_generation(&self, slug: &str) -> JoinHandle<()> {
        let this = self.clone();
        let slug = slug.to_owned();
        tokio::spawn(async move {
            let _ = this.generate(&slug).await;
        })
    }

    pub async fn request(&self, slug: &str) -> PageResponse {
        self.request_at(slug, Utc::now()).await
    }

    /// Serves `slug` as of `now`.
    pub async fn request_at(&self, slug: &str, now: DateTime<Utc>) -> PageResponse {
        let existing = self.pages.read().await.get(slug).cloned();
        if let Some(record) = existing {
            return self.respond(slug, record, now);
        }

        if self.fallback == Fallback::NotFound {
            return PageResponse::NotFound;
        }

        let claimed = {
            let mut pages = self.pages.write().await;
            match pages.get(slug) {
                Some(record) => Err(record.clone()),
                None => {
                    pages.insert(slug.to_owned(), GenerationRecord::Pending);
                    Ok(())
                }
            }
        };
        if let Err(record) = claimed {
            return self.respond(slug, record, now);
        }

        match self.fallback {
            Fallback::Blocking => match self.generate(slug).await {
                Ok(post) => PageResponse::Page { post, stale: false },
                Err(_) => PageResponse::NotFound,
            },
            _ => {
                debug!(slug, "first request, generating in background");
                self.spawn_generation(slug);
                PageResponse::Placeholder
            }
        }
    }

    fn respond(
        &self,
        slug: &str,
        record: GenerationRecord<PostRecord>,
        now: DateTime<Utc>,
    ) -> PageResponse {
        match record {
            GenerationRecord::Built {
                value,
                generated_at,
            } => {
                let stale = self.policy.is_stale(generated_at, now);
                if stale {
                    debug!(slug, %generated_at, "page is stale, revalidating");
                    self.spawn_generation(slug);
                }
                PageResponse::Page { post: value, stale }
            }
            GenerationRecord::Pending => PageResponse::Placeholder,
            GenerationRecord::Missing => PageResponse::NotFound,
        }
    }
}
