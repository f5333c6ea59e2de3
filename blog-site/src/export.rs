use std::path::Path;

use anyhow::Context;
use blog_core::{
    GenerationRecord, ListingCache, ListingView, PostGenerator, PostView, SiteSettings,
};
use tracing::{info, warn};

use crate::templates;

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub pages: usize,
    pub skipped: usize,
}

/// Writes `index.html`, `posts.json` and `post/{slug}.html` for every built
/// page under `out`.
pub async fn export_site(
    generator: &PostGenerator,
    listing: &ListingCache,
    settings: &SiteSettings,
    out: &Path,
) -> anyhow::Result<ExportSummary> {
    let post_dir = out.join("post");
    tokio::fs::create_dir_all(&post_dir)
        .await
        .with_context(|| format!("creating {}", post_dir.display()))?;

    let first_page = listing.get().await.context("generating listing page")?;
    let view = ListingView::from_page(&first_page, settings.locale);
    write(
        &out.join("index.html"),
        templates::listing_page(&settings.title, &view, settings.locale).into_string(),
    )
    .await?;
    write(
        &out.join("posts.json"),
        serde_json::to_string_pretty(first_page.as_ref())?,
    )
    .await?;

    let mut summary = ExportSummary::default();
    for slug in generator.built_slugs().await {
        let Some(GenerationRecord::Built { value, .. }) = generator.record(&slug).await else {
            summary.skipped += 1;
            continue;
        };
        if slug.contains('/') || slug.contains("..") {
            warn!(slug = %slug, "refusing to export slug that is not a plain file name");
            summary.skipped += 1;
            continue;
        }
        let view = PostView::build(&value, settings.locale);
        write(
            &post_dir.join(format!("{slug}.html")),
            templates::post_page(&settings.title, &view, settings.locale).into_string(),
        )
        .await?;
        summary.pages += 1;
    }

    info!(pages = summary.pages, skipped = summary.skipped, out = %out.display(), "exported site");
    Ok(summary)
}

async fn write(path: &Path, contents: String) -> anyhow::Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
