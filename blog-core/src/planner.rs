use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FetchError;
use crate::fetcher::ContentStore;

/// What happens on a request for a slug that was not generated at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Serve a loading placeholder while the page generates in the background.
    #[default]
    Placeholder,
    /// Generate inline and answer with the finished page.
    Blocking,
    /// Unknown slugs are not found; no lookup is made.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    pub slugs: Vec<String>,
    pub fallback: Fallback,
}

#[derive(Debug, Clone, Copy)]
pub struct StaticPathPlanner {
    fallback: Fallback,
}

impl StaticPathPlanner {
    pub fn new(fallback: Fallback) -> Self {
        Self { fallback }
    }

    /// Every slug the content store knows about right now, plus the policy
    /// for slugs that show up later.
    pub async fn plan(&self, store: &dyn ContentStore) -> Result<StaticPaths, FetchError> {
        let mut slugs = store.list_all_slugs().await?;
        let before = slugs.len();
        let mut seen = std::collections::HashSet::new();
        slugs.retain(|slug| seen.insert(slug.clone()));
        info!(
            slugs = slugs.len(),
            duplicates = before - slugs.len(),
            fallback = ?self.fallback,
            "planned static paths"
        );
        Ok(StaticPaths {
            slugs,
            fallback: self.fallback,
        })
    }
}
