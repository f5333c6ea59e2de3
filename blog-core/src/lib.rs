pub mod config;
pub mod date_format;
pub mod error;
pub mod fetcher;
pub mod generation;
pub mod listing;
pub mod model;
pub mod pagination;
pub mod planner;
pub mod read_time;
pub mod revalidation;
pub mod rich_text;
pub mod view;

pub use config::{ContentConfig, SiteConfig, SiteSettings};
pub use date_format::{display_date, format_date, Locale};
pub use error::{ConfigError, FetchError, LookupError};
pub use fetcher::{ContentFetcher, ContentStore};
pub use generation::{BuildReport, GenerationRecord, PageResponse, PageState, PostGenerator};
pub use listing::ListingCache;
pub use model::{Banner, ContentSection, PostPage, PostRecord, PostSummary, RichTextBlock};
pub use pagination::{merge, ListingSession, LoadOutcome, PaginationState};
pub use planner::{Fallback, StaticPathPlanner, StaticPaths};
pub use revalidation::RevalidationPolicy;
pub use view::{ListingView, PostView};
