use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::date_format::Locale;
use crate::error::ConfigError;
use crate::planner::Fallback;
use crate::revalidation::RevalidationPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub content: ContentConfig,
    pub site: SiteSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Content-store API root, e.g. `https://my-blog.cdn.prismic.io/api/v2`.
    pub endpoint: String,
    pub document_type: String,
    pub page_size: u32,
    pub request_timeout_seconds: u64,
    pub retry_attempts: u8,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub title: String,
    pub locale: Locale,
    pub revalidate_hours: u64,
    pub fallback: Fallback,
    pub build_concurrency: usize,
    pub output_dir: PathBuf,
    pub bind_address: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3001/api/v2".into(),
            document_type: "post".into(),
            page_size: 1,
            request_timeout_seconds: 10,
            retry_attempts: 3,
            retry_backoff_ms: 250,
        }
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "spacetraveling".into(),
            locale: Locale::PtBr,
            revalidate_hours: 12,
            fallback: Fallback::Placeholder,
            build_concurrency: 4,
            output_dir: PathBuf::from("out"),
            bind_address: "127.0.0.1:3000".into(),
        }
    }
}

impl ContentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl SiteSettings {
    pub fn revalidation(&self) -> RevalidationPolicy {
        RevalidationPolicy::new(Duration::from_secs(self.revalidate_hours.saturating_mul(60 * 60)))
    }
}

impl SiteConfig {
    /// `~/.config/blog/config.json` on Linux.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("blog").join("config.json"))
    }

    /// Loads the platform config file, falling back to defaults.
    pub fn load() -> Self {
        match Self::config_file_path() {
            Ok(path) => Self::load_from(path),
            Err(err) => {
                warn!(error = %err, "using default configuration");
                Self::default()
            }
        }
    }

    /// Missing file means defaults. A corrupted file is retried from its
    /// `.json.tmp` sibling before giving up.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load_from(path) {
            Ok(config) => config,
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to parse config, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                Self::try_load_from(&tmp).unwrap_or_else(|tmp_err| {
                    warn!(error = %tmp_err, "tmp config unusable, using defaults");
                    Self::default()
                })
            }
        }
    }

    pub fn try_load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Atomic write through a `.json.tmp` sibling.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
