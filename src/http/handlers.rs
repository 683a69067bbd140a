use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::auth::AuthService;
use crate::app::comments::CommentService;
use crate::app::feed::{FeedScope, FeedService};
use crate::app::groups::GroupService;
use crate::app::media::MediaService;
use crate::app::pagination::Paginated;
use crate::app::posts::PostService;
use crate::app::social::SocialService;
use crate::app::users::UserService;
use crate::domain::comment::Comment;
use crate::domain::group::Group;
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::http::{AppError, AuthUser};
use crate::AppState;

/// The global feed keeps a single cached rendering of its default page.
const INDEX_CACHE_KEY: &str = "feed:index";
const INDEX_CACHE_TTL: Duration = Duration::from_secs(20);

const MAX_PASSWORD_LEN: usize = 128;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
}

fn attach_image_urls(state: &AppState, posts: &mut [Post]) {
    for post in posts {
        if let Some(key) = &post.image_key {
            post.image_url = state.storage.public_url(key);
        }
    }
}

fn json_bytes(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let status = if db { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, AppError> {
    // Only the default rendering is cached: one global entry, never
    // keyed per page or per user. Other pages are computed fresh.
    let cacheable = match query.page.as_deref() {
        None => true,
        Some(raw) => raw.trim() == "1",
    };

    if cacheable {
        if let Some(body) = state.cache.get(INDEX_CACHE_KEY).await {
            return Ok(json_bytes(body));
        }
    }

    let service = FeedService::new(state.db.clone());
    let mut page = service
        .select_page(FeedScope::All, query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to build index feed");
            AppError::internal("failed to build index feed")
        })?;
    attach_image_urls(&state, &mut page.items);

    let body = serde_json::to_vec(&page).map_err(|err| {
        tracing::error!(error = ?err, "failed to render index feed");
        AppError::internal("failed to render index feed")
    })?;
    let body = Bytes::from(body);

    if cacheable {
        state
            .cache
            .put(INDEX_CACHE_KEY, body.clone(), INDEX_CACHE_TTL)
            .await;
    }

    Ok(json_bytes(body))
}

#[derive(Serialize)]
pub struct GroupFeedResponse {
    pub group: Group,
    #[serde(flatten)]
    pub page: Paginated<Post>,
}

pub async fn group_feed(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<GroupFeedResponse>, AppError> {
    let group = GroupService::new(state.db.clone())
        .get_by_slug(&slug)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, slug = %slug, "failed to fetch group");
            AppError::internal("failed to fetch group")
        })?
        .ok_or_else(|| AppError::not_found("group not found"))?;

    let service = FeedService::new(state.db.clone());
    let mut page = service
        .select_page(FeedScope::Group(group.id), query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, slug = %slug, "failed to build group feed");
            AppError::internal("failed to build group feed")
        })?;
    attach_image_urls(&state, &mut page.items);

    Ok(Json(GroupFeedResponse { group, page }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub author: User,
    /// Whether the requesting viewer follows this author.
    pub following: bool,
    #[serde(flatten)]
    pub page: Paginated<Post>,
}

pub async fn profile(
    Path(username): Path<String>,
    viewer: Option<AuthUser>,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let author = UserService::new(state.db.clone())
        .get_by_username(&username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to fetch author");
            AppError::internal("failed to fetch author")
        })?
        .ok_or_else(|| AppError::not_found("author not found"))?;

    let following = match &viewer {
        Some(viewer) if viewer.user_id != author.id => SocialService::new(state.db.clone())
            .is_following(viewer.user_id, author.id)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, username = %username, "failed to fetch follow state");
                AppError::internal("failed to fetch follow state")
            })?,
        _ => false,
    };

    let service = FeedService::new(state.db.clone());
    let mut page = service
        .select_page(FeedScope::Author(author.id), query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to build author feed");
            AppError::internal("failed to build author feed")
        })?;
    attach_image_urls(&state, &mut page.items);

    Ok(Json(ProfileResponse {
        author,
        following,
        page,
    }))
}

pub async fn subscriptions_feed(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Paginated<Post>>, AppError> {
    let service = FeedService::new(state.db.clone());
    let mut page = service
        .select_page(FeedScope::SubscriptionsOf(auth.user_id), query.page.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to build subscriptions feed");
            AppError::internal("failed to build subscriptions feed")
        })?;
    attach_image_urls(&state, &mut page.items);

    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct PostDetailResponse {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub author_post_count: i64,
}

pub async fn post_detail(
    Path(post_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PostDetailResponse>, AppError> {
    let posts = PostService::new(state.db.clone());
    let mut post = posts
        .get_post(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;
    if let Some(key) = &post.image_key {
        post.image_url = state.storage.public_url(key);
    }

    let comments = CommentService::new(state.db.clone())
        .list_for_post(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to list comments");
            AppError::internal("failed to list comments")
        })?;

    let author_post_count = posts.count_by_author(post.author_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id, "failed to count author posts");
        AppError::internal("failed to count author posts")
    })?;

    Ok(Json(PostDetailResponse {
        post,
        comments,
        author_post_count,
    }))
}

#[derive(Deserialize)]
pub struct PostPayload {
    pub body: String,
    pub group: Option<String>,
    pub image_key: Option<String>,
}

async fn resolve_group_id(state: &AppState, slug: Option<&str>) -> Result<Option<i64>, AppError> {
    let Some(slug) = slug else {
        return Ok(None);
    };

    let group = GroupService::new(state.db.clone())
        .get_by_slug(slug)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, slug = %slug, "failed to fetch group");
            AppError::internal("failed to fetch group")
        })?
        .ok_or_else(|| AppError::bad_request("unknown group"))?;

    Ok(Some(group.id))
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PostPayload>,
) -> Result<Response, AppError> {
    if payload.body.trim().is_empty() {
        return Err(AppError::bad_request("body cannot be empty"));
    }
    let group_id = resolve_group_id(&state, payload.group.as_deref()).await?;

    let post = PostService::new(state.db.clone())
        .create_post(auth.user_id, payload.body, group_id, payload.image_key)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id = auth.user_id, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    state.cache.remove(INDEX_CACHE_KEY).await;

    Ok(Redirect::to(&format!("/profile/{}/", post.author_username)).into_response())
}

pub async fn edit_post(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PostPayload>,
) -> Result<Response, AppError> {
    let posts = PostService::new(state.db.clone());
    let existing = posts
        .get_post(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;

    // Anyone but the author is bounced to the post itself, unchanged.
    if existing.author_id != auth.user_id {
        return Ok(Redirect::to(&format!("/posts/{}/", post_id)).into_response());
    }

    if payload.body.trim().is_empty() {
        return Err(AppError::bad_request("body cannot be empty"));
    }
    let group_id = resolve_group_id(&state, payload.group.as_deref()).await?;

    posts
        .update_post(post_id, auth.user_id, payload.body, group_id, payload.image_key)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to update post");
            AppError::internal("failed to update post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;

    state.cache.remove(INDEX_CACHE_KEY).await;

    Ok(Redirect::to(&format!("/posts/{}/", post_id)).into_response())
}

#[derive(Deserialize)]
pub struct CommentPayload {
    pub body: String,
}

pub async fn add_comment(
    Path(post_id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentPayload>,
) -> Result<Response, AppError> {
    if payload.body.trim().is_empty() {
        return Err(AppError::bad_request("body cannot be empty"));
    }

    let post = PostService::new(state.db.clone())
        .get_post(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;

    CommentService::new(state.db.clone())
        .add_comment(auth.user_id, post.id, payload.body)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to add comment");
            AppError::internal("failed to add comment")
        })?;

    Ok(Redirect::to(&format!("/posts/{}/", post_id)).into_response())
}

// ---------------------------------------------------------------------------
// Follow graph
// ---------------------------------------------------------------------------

pub async fn follow_author(
    Path(username): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let author = UserService::new(state.db.clone())
        .get_by_username(&username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to fetch author");
            AppError::internal("failed to fetch author")
        })?
        .ok_or_else(|| AppError::not_found("author not found"))?;

    // Self-follow and an already-present edge are silent no-ops; the
    // outcome is the same redirect either way.
    SocialService::new(state.db.clone())
        .follow(auth.user_id, author.id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, follower_id = auth.user_id, followee_id = author.id, "failed to follow author");
            AppError::internal("failed to follow author")
        })?;

    Ok(Redirect::to("/follow/").into_response())
}

pub async fn unfollow_author(
    Path(username): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let author = UserService::new(state.db.clone())
        .get_by_username(&username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to fetch author");
            AppError::internal("failed to fetch author")
        })?
        .ok_or_else(|| AppError::not_found("author not found"))?;

    SocialService::new(state.db.clone())
        .unfollow(auth.user_id, author.id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, follower_id = auth.user_id, followee_id = author.id, "failed to unfollow author");
            AppError::internal("failed to unfollow author")
        })?;

    Ok(Redirect::to("/follow/").into_response())
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<User>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::bad_request("username cannot be empty"));
    }
    if payload.password.trim().len() < 8 {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.paseto_refresh_key,
        state.access_ttl_minutes,
        state.refresh_ttl_days,
    );
    let user = service
        .signup(payload.username, payload.password)
        .await
        .map_err(|err| {
            if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
                if let Some(db_err) = sqlx_err.as_database_error() {
                    if db_err.code().as_deref() == Some("23505") {
                        return AppError::conflict("username already taken");
                    }
                }
            }
            tracing::error!(error = ?err, "failed to create user");
            AppError::internal("failed to create user")
        })?;

    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_expires_at: OffsetDateTime,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.paseto_refresh_key,
        state.access_ttl_minutes,
        state.refresh_ttl_days,
    );
    let tokens = service
        .login(&payload.username, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        })),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.paseto_refresh_key,
        state.access_ttl_minutes,
        state.refresh_ttl_days,
    );
    let tokens = service
        .refresh(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to refresh token");
            AppError::internal("failed to refresh token")
        })?;

    match tokens {
        Some(tokens) => Ok(Json(AuthTokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        })),
        None => Err(AppError::unauthorized("invalid refresh token")),
    }
}

pub async fn revoke_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refresh_token is required"));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.paseto_refresh_key,
        state.access_ttl_minutes,
        state.refresh_ttl_days,
    );
    service
        .revoke_refresh_token(&payload.refresh_token)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to revoke token");
            AppError::internal("failed to revoke token")
        })?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct UploadResponse {
    pub image_key: String,
    pub image_url: Option<String>,
}

pub async fn upload_image(
    auth: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request("empty upload"));
    }

    let stored = MediaService::new(state.storage.clone())
        .store_image(body.to_vec())
        .await
        .map_err(|err| {
            if err.to_string().contains("unsupported image format") {
                return AppError::bad_request("unsupported image format");
            }
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to store image");
            AppError::internal("failed to store image")
        })?;

    Ok(Json(UploadResponse {
        image_key: stored.image_key,
        image_url: stored.image_url,
    }))
}
