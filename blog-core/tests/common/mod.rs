#![allow(dead_code)]

use std::time::Duration;

use blog_core::{ContentConfig, ContentFetcher, GenerationRecord, PageState, PostGenerator};
use reqwest::Client;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SEARCH: &str = "/api/v2/documents/search";

pub fn content_config(server: &MockServer) -> ContentConfig {
    ContentConfig {
        endpoint: format!("{}/api/v2", server.uri()),
        document_type: "post".into(),
        page_size: 2,
        request_timeout_seconds: 2,
        retry_attempts: 1,
        retry_backoff_ms: 10,
    }
}

pub fn fetcher(server: &MockServer) -> ContentFetcher {
    ContentFetcher::new(Client::new(), content_config(server))
}

pub async fn mount_master_ref(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refs": [
                { "id": "preview", "ref": "PREVIEW", "isMasterRef": false },
                { "id": "master", "ref": "MASTER", "isMasterRef": true }
            ]
        })))
        .mount(server)
        .await;
}

pub fn summary_json(uid: &str) -> Value {
    json!({
        "uid": uid,
        "type": "post",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": { "title": format!("Title {uid}"), "subtitle": "Sub", "author": "Ana" }
    })
}

pub fn page_json(uids: &[&str], next_page: Option<String>) -> Value {
    json!({
        "page": 1,
        "next_page": next_page,
        "results": uids.iter().map(|uid| summary_json(uid)).collect::<Vec<_>>()
    })
}

pub fn document_json(uid: &str, words: usize) -> Value {
    let text = vec!["palavra"; words].join(" ");
    json!({
        "uid": uid,
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": format!("Title {uid}"),
            "subtitle": "Sub",
            "author": "Ana",
            "banner": { "url": "https://images.test/banner.png", "alt": "banner" },
            "content": [
                { "heading": "Intro", "body": [ { "type": "paragraph", "text": text, "spans": [] } ] }
            ]
        }
    })
}

pub fn uid_query(uid: &str) -> String {
    format!("[[at(my.post.uid,\"{uid}\")]]")
}

pub async fn mount_document(server: &MockServer, uid: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("q", uid_query(uid).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next_page": null,
            "results": [body]
        })))
        .mount(server)
        .await;
}

pub async fn mount_missing(server: &MockServer, uid: &str) {
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("q", uid_query(uid).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next_page": null,
            "results": []
        })))
        .mount(server)
        .await;
}

pub async fn wait_for_state(generator: &PostGenerator, slug: &str, expected: PageState) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while generator.state(slug).await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for page state");
}

pub async fn generated_at(
    generator: &PostGenerator,
    slug: &str,
) -> Option<chrono::DateTime<chrono::Utc>> {
    match generator.record(slug).await {
        Some(GenerationRecord::Built { generated_at, .. }) => Some(generated_at),
        _ => None,
    }
}
