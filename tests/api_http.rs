// tests/api_http.rs
//
// HTTP-level tests for the archive Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use daily_story::api;
use daily_story::metrics::Metrics;
use daily_story::store::{Document, DocumentStore, MarkdownDirStore};
use daily_story::Item;

const BODY_LIMIT: usize = 1024 * 1024;

async fn seeded_store(dir: &std::path::Path) -> Arc<MarkdownDirStore> {
    let store = Arc::new(MarkdownDirStore::new(dir));
    for (day, title) in [(1, "Quake hits Japan"), (2, "Senate passes bill")] {
        let item = Item {
            title: title.into(),
            url: format!("https://news.test/{day}"),
            source: "Reuters".into(),
            published_at: Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap(),
            description: None,
            content: None,
        };
        let doc = Document::for_story(
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            &item,
            format!("Body for {title}."),
        );
        store.put(&doc).await.unwrap();
    }
    store
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

#[tokio::test]
async fn health_returns_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let app = api::router(Arc::new(MarkdownDirStore::new(tmp.path())), None);
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "OK");
}

#[tokio::test]
async fn latest_and_listing_are_newest_first() {
    let tmp = tempfile::tempdir().unwrap();
    let app = api::router(seeded_store(tmp.path()).await, None);

    let (status, body) = get(app.clone(), "/api/latest").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["name"], "2024-05-02-senate-passes-bill");
    assert_eq!(v["primarySource"], "Reuters");
    assert!(v.get("body").is_none(), "listing carries metadata only");

    let (_, body) = get(app, "/api/posts").await;
    let v: Json = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["2024-05-02-senate-passes-bill", "2024-05-01-quake-hits-japan"]);
}

#[tokio::test]
async fn latest_is_null_for_empty_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let app = api::router(Arc::new(MarkdownDirStore::new(tmp.path().join("empty"))), None);
    let (status, body) = get(app, "/api/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Json>(&body).unwrap(), Json::Null);
}

#[tokio::test]
async fn single_post_and_missing_post() {
    let tmp = tempfile::tempdir().unwrap();
    let app = api::router(seeded_store(tmp.path()).await, None);

    let (status, body) = get(app.clone(), "/api/posts/2024-05-01-quake-hits-japan").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["title"], "Quake hits Japan");
    assert_eq!(v["date"], "2024-05-01");
    assert_eq!(v["body"], "Body for Quake hits Japan.");

    let (status, _) = get(app, "/api/posts/2030-01-01-nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_route_only_when_attached() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(MarkdownDirStore::new(tmp.path()));

    let (status, _) = get(api::router(store.clone(), None), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(api::router(store, Some(Metrics::detached())), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
}
