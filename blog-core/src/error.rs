use reqwest::StatusCode;
use thiserror::Error;

/// Failure while talking to the content store. Recoverable: callers keep
/// their previous state and may retry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("content store answered {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid content store url: {0}")]
    Url(#[from] url::ParseError),
    #[error("content store exposes no master ref")]
    MissingRef,
}

/// Failure while resolving a single post by slug.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no post with slug `{0}`")]
    SlugNotFound(String),
    #[error("post `{slug}` is malformed: {reason}")]
    MalformedRecord { slug: String, reason: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl LookupError {
    /// Lookups that can never succeed for this slug until the content store
    /// changes. Transport failures are not terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LookupError::SlugNotFound(_) | LookupError::MalformedRecord { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory on this platform")]
    NoConfigDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
