use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};

use crate::app::auth::AuthService;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Rejection for write paths hit without a valid actor: redirect to the
/// login view, preserving the original target for post-login
/// continuation.
#[derive(Debug)]
pub struct LoginRedirect {
    next: String,
}

impl LoginRedirect {
    fn for_request(parts: &Parts) -> Self {
        Self {
            next: parts.uri.path().to_string(),
        }
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&format!("/auth/login/?next={}", self.next)).into_response()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| LoginRedirect::for_request(parts))?;

        let service = AuthService::new(
            state.db.clone(),
            state.paseto_access_key,
            state.paseto_refresh_key,
            state.access_ttl_minutes,
            state.refresh_ttl_days,
        );

        // An invalid or expired token is treated as anonymous.
        let session = service
            .authenticate_access_token(token)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| LoginRedirect::for_request(parts))?;

        Ok(AuthUser {
            user_id: session.user_id,
        })
    }
}
