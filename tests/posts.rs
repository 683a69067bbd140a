//! Post Lifecycle Tests
//!
//! Covers create, detail, edit authorization, and comments.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

// ===========================================================================
// Create
// ===========================================================================

#[tokio::test]
async fn anonymous_create_redirects_to_login() {
    let app = app().await;

    let resp = app.post_json("/create/", json!({"body": "hi"}), None).await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), "/auth/login/?next=/create/");
}

#[tokio::test]
async fn create_post_redirects_to_author_profile() {
    let app = app().await;
    let user = app.create_user("post_create").await;

    let resp = app
        .post_json(
            "/create/",
            json!({"body": "first post"}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), format!("/profile/{}/", user.username));

    let profile = app
        .get(&format!("/profile/{}/", user.username), None)
        .await;
    let items = profile.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["body"].as_str().unwrap(), "first post");
}

#[tokio::test]
async fn create_post_with_group_appears_in_group_feed() {
    let app = app().await;
    let user = app.create_user("post_grouped").await;
    app.create_group("posting-group", "Posting").await;

    let resp = app
        .post_json(
            "/create/",
            json!({"body": "grouped post", "group": "posting-group"}),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    let feed = app.get("/group/posting-group/", None).await;
    let body = feed.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["body"].as_str().unwrap(), "grouped post");
    assert_eq!(items[0]["group_slug"].as_str().unwrap(), "posting-group");
}

#[tokio::test]
async fn create_post_rejects_empty_body() {
    let app = app().await;
    let user = app.create_user("post_empty").await;

    let resp = app
        .post_json("/create/", json!({"body": "   "}), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "body cannot be empty");
}

#[tokio::test]
async fn create_post_rejects_unknown_group() {
    let app = app().await;
    let user = app.create_user("post_badgrp").await;

    let resp = app
        .post_json(
            "/create/",
            json!({"body": "hi", "group": "does-not-exist"}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "unknown group");
}

// ===========================================================================
// Detail
// ===========================================================================

#[tokio::test]
async fn detail_unknown_post_is_not_found() {
    let app = app().await;

    let resp = app.get("/posts/999999999/", None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detail_includes_author_post_count() {
    let app = app().await;
    let user = app.create_user("post_count").await;

    app.create_post(user.id, None, "one").await;
    let post_id = app.create_post(user.id, None, "two").await;

    let resp = app.get(&format!("/posts/{}/", post_id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["post"]["body"].as_str().unwrap(), "two");
    assert_eq!(body["author_post_count"].as_i64().unwrap(), 2);
}

// ===========================================================================
// Edit
// ===========================================================================

#[tokio::test]
async fn author_can_edit_own_post() {
    let app = app().await;
    let user = app.create_user("edit_own").await;
    let post_id = app.create_post(user.id, None, "before").await;

    let resp = app
        .post_json(
            &format!("/posts/{}/edit/", post_id),
            json!({"body": "after"}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), format!("/posts/{}/", post_id));

    let detail = app.get(&format!("/posts/{}/", post_id), None).await;
    assert_eq!(detail.json()["post"]["body"].as_str().unwrap(), "after");
}

#[tokio::test]
async fn non_author_edit_redirects_to_detail_and_changes_nothing() {
    let app = app().await;
    let author = app.create_user("edit_author").await;
    let intruder = app.create_user("edit_intruder").await;
    let post_id = app.create_post(author.id, None, "original").await;

    let resp = app
        .post_json(
            &format!("/posts/{}/edit/", post_id),
            json!({"body": "hijacked"}),
            Some(&intruder.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), format!("/posts/{}/", post_id));

    let detail = app.get(&format!("/posts/{}/", post_id), None).await;
    assert_eq!(detail.json()["post"]["body"].as_str().unwrap(), "original");
}

#[tokio::test]
async fn edit_unknown_post_is_not_found() {
    let app = app().await;
    let user = app.create_user("edit_ghost").await;

    let resp = app
        .post_json(
            "/posts/999999999/edit/",
            json!({"body": "hi"}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_edit_redirects_to_login() {
    let app = app().await;
    let author = app.create_user("edit_anon").await;
    let post_id = app.create_post(author.id, None, "untouchable").await;

    let resp = app
        .post_json(&format!("/posts/{}/edit/", post_id), json!({"body": "x"}), None)
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(
        resp.location(),
        format!("/auth/login/?next=/posts/{}/edit/", post_id)
    );
}

// ===========================================================================
// Comments
// ===========================================================================

#[tokio::test]
async fn anonymous_comment_redirects_to_login_with_next() {
    let app = app().await;
    let author = app.create_user("cmt_anon").await;
    let post_id = app.create_post(author.id, None, "quiet post").await;

    let resp = app
        .post_json(
            &format!("/posts/{}/comment/", post_id),
            json!({"body": "hello"}),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(
        resp.location(),
        format!("/auth/login/?next=/posts/{}/comment/", post_id)
    );
}

#[tokio::test]
async fn comments_list_in_creation_order() {
    let app = app().await;
    let author = app.create_user("cmt_author").await;
    let commenter = app.create_user("cmt_commenter").await;
    let post_id = app.create_post(author.id, None, "discuss").await;

    for body in ["first", "second"] {
        let resp = app
            .post_json(
                &format!("/posts/{}/comment/", post_id),
                json!({"body": body}),
                Some(&commenter.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::SEE_OTHER);
        assert_eq!(resp.location(), format!("/posts/{}/", post_id));
    }

    let detail = app.get(&format!("/posts/{}/", post_id), None).await;
    let body = detail.json();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["body"].as_str().unwrap(), "first");
    assert_eq!(comments[1]["body"].as_str().unwrap(), "second");
    assert_eq!(
        comments[0]["author_username"].as_str().unwrap(),
        commenter.username
    );
}

#[tokio::test]
async fn comment_on_unknown_post_is_not_found() {
    let app = app().await;
    let user = app.create_user("cmt_ghost").await;

    let resp = app
        .post_json(
            "/posts/999999999/comment/",
            json!({"body": "hi"}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_rejects_empty_body() {
    let app = app().await;
    let user = app.create_user("cmt_empty").await;
    let post_id = app.create_post(user.id, None, "needs words").await;

    let resp = app
        .post_json(
            &format!("/posts/{}/comment/", post_id),
            json!({"body": ""}),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
