//! Global Feed Tests
//!
//! The index view is the only cached view and is inherently global, so
//! these tests serialize on a shared lock and use far-future timestamps
//! to keep their posts at the top of the feed.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

static INDEX_LOCK: Mutex<()> = Mutex::const_new(());

#[tokio::test]
async fn index_orders_by_timestamp_not_insertion() {
    let app = app().await;
    let _guard = INDEX_LOCK.lock().await;
    app.state.cache.clear().await;

    let user = app.create_user("idx_order").await;
    let base = OffsetDateTime::now_utc() + Duration::hours(10);

    // Insert out of chronological order on purpose.
    app.create_post_at(user.id, None, "idx middle", base + Duration::hours(1))
        .await;
    app.create_post_at(user.id, None, "idx newest", base + Duration::hours(2))
        .await;
    app.create_post_at(user.id, None, "idx oldest", base)
        .await;

    let resp = app.get("/", None).await;
    assert_eq!(resp.status, StatusCode::OK);

    let body = resp.json();
    let bodies: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .take(3)
        .map(|item| item["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["idx newest", "idx middle", "idx oldest"]);
}

#[tokio::test]
async fn index_is_cached_until_invalidated() {
    let app = app().await;
    let _guard = INDEX_LOCK.lock().await;
    app.state.cache.clear().await;

    let user = app.create_user("idx_cache").await;

    let first = app.get("/", None).await;
    assert_eq!(first.status, StatusCode::OK);

    // Mutate the underlying data behind the cache's back.
    app.create_post_at(
        user.id,
        None,
        "idx sneaky post",
        OffsetDateTime::now_utc() + Duration::hours(1),
    )
    .await;

    // Within the TTL the rendering is byte-identical to the first read.
    let second = app.get("/", None).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body_bytes, second.body_bytes);

    // Explicit invalidation makes the mutation visible.
    app.state.cache.clear().await;
    let third = app.get("/", None).await;
    assert_eq!(third.status, StatusCode::OK);
    assert_ne!(first.body_bytes, third.body_bytes);
    let bodies: Vec<String> = third.json()["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["body"].as_str().unwrap().to_string())
        .collect();
    assert!(bodies.contains(&"idx sneaky post".to_string()));
}

#[tokio::test]
async fn creating_a_post_invalidates_the_index_cache() {
    let app = app().await;
    let _guard = INDEX_LOCK.lock().await;
    app.state.cache.clear().await;

    let user = app.create_user("idx_invalidate").await;

    // Prime the cache.
    let primed = app.get("/", None).await;
    assert_eq!(primed.status, StatusCode::OK);

    // A write through the API must guarantee freshness for the next read.
    let resp = app
        .post_json(
            "/create/",
            json!({"body": "idx fresh post"}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    let after = app.get("/", None).await;
    let bodies: Vec<String> = after.json()["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["body"].as_str().unwrap().to_string())
        .collect();
    assert!(bodies.contains(&"idx fresh post".to_string()));
}

#[tokio::test]
async fn non_default_pages_bypass_the_cache() {
    let app = app().await;
    let _guard = INDEX_LOCK.lock().await;
    app.state.cache.clear().await;

    // Prime the single global entry.
    let first = app.get("/", None).await;
    assert_eq!(first.status, StatusCode::OK);

    // A request for another page is computed fresh, never served from
    // the page-one entry.
    let paged = app.get("/?page=2", None).await;
    assert_eq!(paged.status, StatusCode::OK);
    let body = paged.json();
    assert!(body["page"].as_i64().is_some());
}
