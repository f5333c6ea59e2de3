use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use blog_core::{
    ListingCache, ListingView, PageResponse, PostGenerator, PostView, SiteSettings,
};
use maud::Markup;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::templates;

#[derive(Clone)]
pub struct AppState {
    pub generator: PostGenerator,
    pub listing: ListingCache,
    pub settings: Arc<SiteSettings>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/{slug}", get(post_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind = state.settings.bind_address.clone();
    let listener = TcpListener::bind(&bind).await?;
    info!(address = %bind, "serving blog");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn page(status: StatusCode, markup: Markup, cache_control: &str) -> Response {
    let mut res = (status, Html(markup.into_string())).into_response();
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        res.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    res
}

fn revalidating(settings: &SiteSettings) -> String {
    format!(
        "s-maxage={}, stale-while-revalidate",
        settings.revalidation().max_age_secs()
    )
}

async fn index_handler(State(state): State<AppState>) -> Response {
    let settings = &state.settings;
    match state.listing.get().await {
        Ok(first_page) => {
            let view = ListingView::from_page(&first_page, settings.locale);
            page(
                StatusCode::OK,
                templates::listing_page(&settings.title, &view, settings.locale),
                &revalidating(settings),
            )
        }
        Err(err) => {
            warn!(error = %err, "listing page unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "listing unavailable").into_response()
        }
    }
}

async fn post_handler(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let settings = &state.settings;
    match state.generator.request(&slug).await {
        PageResponse::Page { post, .. } => {
            let view = PostView::build(&post, settings.locale);
            page(
                StatusCode::OK,
                templates::post_page(&settings.title, &view, settings.locale),
                &revalidating(settings),
            )
        }
        PageResponse::Placeholder => page(
            StatusCode::OK,
            templates::placeholder_page(&settings.title, settings.locale),
            "no-store",
        ),
        PageResponse::NotFound => page(
            StatusCode::NOT_FOUND,
            templates::not_found_page(&settings.title, settings.locale),
            "no-store",
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use blog_core::{
        Banner, ContentStore, Fallback, FetchError, LookupError, PageState, PostPage,
        PostRecord, RevalidationPolicy,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    struct FakeStore;

    #[async_trait]
    impl ContentStore for FakeStore {
        async fn list_posts(&self, _page: Option<u32>) -> Result<PostPage, FetchError> {
            Ok(serde_json::from_str(
                r#"{ "next_page": "https://cms.test/p2",
                     "results": [{ "uid": "hello", "first_publication_date": null,
                                   "data": { "title": "Hello", "subtitle": "s", "author": "Ana" } }] }"#,
            )?)
        }

        async fn fetch_page(&self, _url: &str) -> Result<PostPage, FetchError> {
            Ok(PostPage::default())
        }

        async fn get_post_by_slug(&self, slug: &str) -> Result<PostRecord, LookupError> {
            if slug != "hello" {
                return Err(LookupError::SlugNotFound(slug.into()));
            }
            Ok(PostRecord {
                uid: "hello".into(),
                published_at: None,
                title: "Hello".into(),
                subtitle: "s".into(),
                author: "Ana".into(),
                banner: Banner::default(),
                content: Vec::new(),
            })
        }

        async fn list_all_slugs(&self) -> Result<Vec<String>, FetchError> {
            Ok(vec!["hello".into()])
        }
    }

    fn state() -> AppState {
        let store: Arc<dyn ContentStore> = Arc::new(FakeStore);
        let policy = RevalidationPolicy::default();
        AppState {
            generator: PostGenerator::new(store.clone(), policy, Fallback::Placeholder),
            listing: ListingCache::new(store, policy),
            settings: Arc::new(SiteSettings::default()),
        }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_lists_posts_with_load_more() {
        let (status, body) = get(router(state()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Hello"));
        assert!(body.contains("data-next-page=\"https://cms.test/p2\""));
    }

    #[tokio::test]
    async fn unknown_post_goes_through_placeholder_then_not_found() {
        let state = state();
        let (status, body) = get(router(state.clone()), "/post/missing").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));

        tokio::time::timeout(Duration::from_secs(2), async {
            while state.generator.state("missing").await != PageState::NotFound {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let (status, _) = get(router(state), "/post/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn prebuilt_post_renders_read_time() {
        let state = state();
        state.generator.prebuild(&["hello".to_string()], 1).await;
        let (status, body) = get(router(state), "/post/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("0 min"));
        assert!(body.contains("data desconhecida"));
    }
}
