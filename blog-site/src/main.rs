mod export;
mod server;
mod templates;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use blog_core::{
    display_date, ContentFetcher, ContentStore, ListingCache, ListingSession, LoadOutcome,
    PostGenerator, SiteConfig, StaticPathPlanner,
};
use clap::{Parser, Subcommand};
use reqwest::{redirect, ClientBuilder};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::server::AppState;

#[derive(Debug, Parser)]
#[command(name = "blog-site", version, about = "Blog backed by a headless content store")]
struct Cli {
    /// Config file; defaults to the platform config dir (blog/config.json).
    #[arg(long, global = true, env = "BLOG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prebuild known posts and serve `/` and `/post/{slug}`.
    Serve,
    /// Generate every known page into a directory.
    Build {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the post listing.
    Posts {
        /// Keep loading pages until the last one.
        #[arg(long)]
        all: bool,
    },
    /// Write the default configuration to the config file.
    InitConfig {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if let Command::InitConfig { force } = cli.command {
        let path = match cli.config {
            Some(path) => path,
            None => SiteConfig::config_file_path()?,
        };
        init_config(&path, force)?;
        info!(path = %path.display(), "wrote default configuration");
        return Ok(());
    }
    let config = match &cli.config {
        Some(path) => SiteConfig::load_from(path),
        None => SiteConfig::load(),
    };

    let client = ClientBuilder::new()
        .redirect(redirect::Policy::limited(5))
        .user_agent(concat!("blog-site/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let fetcher = Arc::new(ContentFetcher::new(client, config.content.clone()));

    match cli.command {
        Command::Serve => serve(fetcher, config).await,
        Command::Build { out } => build(fetcher, config, out).await,
        Command::Posts { all } => posts(fetcher, config, all).await,
        Command::InitConfig { .. } => Ok(()),
    }
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists, pass --force to replace it", path.display());
    }
    SiteConfig::default()
        .save_to(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn site_parts(fetcher: Arc<ContentFetcher>, config: &SiteConfig) -> (PostGenerator, ListingCache) {
    let store: Arc<dyn ContentStore> = fetcher;
    let policy = config.site.revalidation();
    (
        PostGenerator::new(store.clone(), policy, config.site.fallback),
        ListingCache::new(store, policy),
    )
}

async fn serve(fetcher: Arc<ContentFetcher>, config: SiteConfig) -> anyhow::Result<()> {
    let (generator, listing) = site_parts(fetcher.clone(), &config);

    match StaticPathPlanner::new(config.site.fallback).plan(fetcher.as_ref()).await {
        Ok(paths) => {
            generator
                .prebuild(&paths.slugs, config.site.build_concurrency)
                .await;
        }
        Err(err) => warn!(error = %err, "could not enumerate posts, pages will generate on demand"),
    }
    if let Err(err) = listing.regenerate().await {
        warn!(error = %err, "listing page will generate on first request");
    }

    server::serve(AppState {
        generator,
        listing,
        settings: Arc::new(config.site),
    })
    .await
}

async fn build(
    fetcher: Arc<ContentFetcher>,
    config: SiteConfig,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (generator, listing) = site_parts(fetcher.clone(), &config);
    let paths = StaticPathPlanner::new(config.site.fallback)
        .plan(fetcher.as_ref())
        .await
        .context("enumerating posts")?;
    let report = generator
        .prebuild(&paths.slugs, config.site.build_concurrency)
        .await;
    for slug in &report.failed {
        warn!(slug = %slug, "post could not be generated");
    }

    let out = out.unwrap_or_else(|| config.site.output_dir.clone());
    let summary = export::export_site(&generator, &listing, &config.site, &out).await?;
    info!(
        pages = summary.pages,
        not_found = report.not_found.len(),
        failed = report.failed.len(),
        "build finished"
    );
    Ok(())
}

async fn posts(fetcher: Arc<ContentFetcher>, config: SiteConfig, all: bool) -> anyhow::Result<()> {
    let first = fetcher.list_posts(None).await.context("fetching first page")?;
    let session = ListingSession::new(first);

    if all {
        while session.has_more().await {
            match session.load_more(fetcher.as_ref()).await {
                LoadOutcome::Loaded { .. } => {}
                LoadOutcome::Failed => anyhow::bail!("could not load the next listing page"),
                _ => break,
            }
        }
    }

    let state = session.snapshot().await;
    for post in &state.loaded_posts {
        println!(
            "{}  {}  {} ({})",
            display_date(post.published_at.as_ref(), config.site.locale),
            post.uid,
            post.title,
            post.author
        );
    }
    if let Some(next) = &state.next_page_url {
        println!("more: {next}");
    }
    Ok(())
}
