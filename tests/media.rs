//! Upload Tests
//!
//! Payload validation happens before any storage write, so these run
//! without object storage infrastructure.

mod common;

use axum::http::StatusCode;
use common::app;

#[tokio::test]
async fn anonymous_upload_redirects_to_login() {
    let app = app().await;

    let resp = app.post_bytes("/media/upload/", vec![1, 2, 3], None).await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), "/auth/login/?next=/media/upload/");
}

#[tokio::test]
async fn upload_rejects_empty_payload() {
    let app = app().await;
    let user = app.create_user("media_empty").await;

    let resp = app
        .post_bytes("/media/upload/", vec![], Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "empty upload");
}

#[tokio::test]
async fn upload_rejects_non_image_payload() {
    let app = app().await;
    let user = app.create_user("media_garbage").await;

    let resp = app
        .post_bytes(
            "/media/upload/",
            b"definitely not an image".to_vec(),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "unsupported image format");
}
