use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::{AuthUser, LoginRedirect};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let media = routes::media()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.upload_max_bytes));

    Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::feeds())
        .merge(routes::posts())
        .merge(routes::profiles())
        .merge(media)
        .with_state(state)
}
