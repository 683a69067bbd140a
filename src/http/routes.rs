use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", post(handlers::signup))
        .route("/auth/login/", post(handlers::login))
        .route("/auth/refresh/", post(handlers::refresh_token))
        .route("/auth/revoke/", post(handlers::revoke_token))
}

pub fn feeds() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/group/:slug/", get(handlers::group_feed))
        .route("/follow/", get(handlers::subscriptions_feed))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/create/", post(handlers::create_post))
        .route("/posts/:post_id/", get(handlers::post_detail))
        .route("/posts/:post_id/edit/", post(handlers::edit_post))
        .route("/posts/:post_id/comment/", post(handlers::add_comment))
}

pub fn profiles() -> Router<AppState> {
    Router::new()
        .route("/profile/:username/", get(handlers::profile))
        .route("/profile/:username/follow/", post(handlers::follow_author))
        .route(
            "/profile/:username/unfollow/",
            post(handlers::unfollow_author),
        )
}

pub fn media() -> Router<AppState> {
    Router::new().route("/media/upload/", post(handlers::upload_image))
}
