use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ContentConfig;
use crate::error::{FetchError, LookupError};
use crate::model::{PostDocument, PostPage, PostRecord};

const SLUG_PAGE_SIZE: u32 = 100;

/// Read side of the headless content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Listing page `page` (1-based, `None` for the first page).
    async fn list_posts(&self, page: Option<u32>) -> Result<PostPage, FetchError>;

    /// Follows a `next_page` URL verbatim.
    async fn fetch_page(&self, url: &str) -> Result<PostPage, FetchError>;

    async fn get_post_by_slug(&self, slug: &str) -> Result<PostRecord, LookupError>;

    async fn list_all_slugs(&self) -> Result<Vec<String>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default)]
    next_page: Option<String>,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SlugOnly {
    #[serde(default)]
    uid: Option<String>,
}

/// HTTP client for the content store's search API.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    config: ContentConfig,
}

impl ContentFetcher {
    pub fn new(client: Client, config: ContentConfig) -> Self {
        Self { client, config }
    }

    async fn master_ref(&self) -> Result<String, FetchError> {
        let info: ApiInfo = self.get_json(&self.config.endpoint).await?;
        info.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or(FetchError::MissingRef)
    }

    fn search_url(
        &self,
        reference: &str,
        predicate: &str,
        page: u32,
        page_size: u32,
        fetch: Option<&str>,
    ) -> Result<Url, FetchError> {
        let base = format!(
            "{}/documents/search",
            self.config.endpoint.trim_end_matches('/')
        );
        let mut url = Url::parse(&base)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("ref", reference)
                .append_pair("q", &format!("[{predicate}]"))
                .append_pair("pageSize", &page_size.to_string())
                .append_pair("page", &page.to_string());
            if let Some(fields) = fetch {
                query.append_pair("fetch", fields);
            }
        }
        Ok(url)
    }

    fn type_predicate(&self) -> String {
        format!("[at(document.type,\"{}\")]", self.config.document_type)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut attempt: u8 = 0;
        loop {
            match self.get_once(url).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.config.retry_attempts && is_transient(&err) => {
                    attempt += 1;
                    debug!(url, attempt, error = %err, "retrying content store request");
                    tokio::time::sleep(self.config.retry_backoff() * u32::from(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.config.request_timeout())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_owned(),
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn is_transient(err: &FetchError) -> bool {
    match err {
        FetchError::Network(_) => true,
        FetchError::Status { status, .. } => status.is_server_error(),
        _ => false,
    }
}

#[async_trait]
impl ContentStore for ContentFetcher {
    async fn list_posts(&self, page: Option<u32>) -> Result<PostPage, FetchError> {
        let reference = self.master_ref().await?;
        let fields = format!(
            "{0}.title,{0}.subtitle,{0}.author",
            self.config.document_type
        );
        let url = self.search_url(
            &reference,
            &self.type_predicate(),
            page.unwrap_or(1),
            self.config.page_size,
            Some(&fields),
        )?;
        self.get_json(url.as_str()).await
    }

    async fn fetch_page(&self, url: &str) -> Result<PostPage, FetchError> {
        self.get_json(url).await
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<PostRecord, LookupError> {
        let reference = self.master_ref().await?;
        let predicate = format!(
            "[at(my.{}.uid,\"{}\")]",
            self.config.document_type,
            slug.replace('\\', "\\\\").replace('"', "\\\"")
        );
        let url = self.search_url(&reference, &predicate, 1, 1, None)?;
        let response: SearchResponse<serde_json::Value> = self.get_json(url.as_str()).await?;

        let raw = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::SlugNotFound(slug.to_owned()))?;
        let document: PostDocument =
            serde_json::from_value(raw).map_err(|err| LookupError::MalformedRecord {
                slug: slug.to_owned(),
                reason: err.to_string(),
            })?;
        document.into_record(slug)
    }

    async fn list_all_slugs(&self) -> Result<Vec<String>, FetchError> {
        let reference = self.master_ref().await?;
        let first = self.search_url(
            &reference,
            &self.type_predicate(),
            1,
            SLUG_PAGE_SIZE,
            Some(&format!("{}.title", self.config.document_type)),
        )?;

        let mut slugs = Vec::new();
        let mut next = Some(first.to_string());
        while let Some(url) = next {
            let page: SearchResponse<SlugOnly> = self.get_json(&url).await?;
            for doc in page.results {
                match doc.uid {
                    Some(uid) if !uid.is_empty() => slugs.push(uid),
                    _ => warn!(url = %url, "document without uid skipped"),
                }
            }
            next = page.next_page;
        }
        debug!(count = slugs.len(), "enumerated post slugs");
        Ok(slugs)
    }
}
