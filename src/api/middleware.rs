//! API middleware
//!
//! Contains:
//! - Shared application state
//! - `ApiError`, the JSON error body every handler returns, and its mapping
//!   from service and policy errors
//! - Token authentication (`Authorization: Token <key>` or `Bearer <key>`)
//! - Extractors for the acting user

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::{
    SqlxBlogRepository, SqlxPostRepository, SqlxTagRepository, SqlxTokenRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::policy::{Actor, PolicyError};
use crate::services::{
    BlogService, BlogServiceError, PostService, PostServiceError, TagService, TagServiceError,
    UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub blog_service: Arc<BlogService>,
    pub post_service: Arc<PostService>,
    pub tag_service: Arc<TagService>,
}

impl AppState {
    /// Wire repositories and services over one database pool
    pub fn new(pool: DynDatabasePool) -> Self {
        let user_service = Arc::new(UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxTokenRepository::boxed(pool.clone()),
        ));
        let blog_service = Arc::new(BlogService::new(SqlxBlogRepository::boxed(pool.clone())));
        let tag_service = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        let post_service = Arc::new(PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            blog_service.clone(),
            tag_service.clone(),
        ));

        Self {
            pool,
            user_service,
            blog_service,
            post_service,
            tag_service,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new("INVALID_CREDENTIALS", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "Request failed");
        Self::internal_error("Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" | "INVALID_CREDENTIALS" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::NotAuthenticated(msg) => Self::unauthorized(msg),
            PolicyError::PermissionDenied(msg) => Self::forbidden(msg),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidCredentials(msg) => Self::invalid_credentials(msg),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::UserExists(msg) => Self::conflict(msg),
            UserServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::NotFound(_) => Self::not_found("Blog not found"),
            BlogServiceError::ValidationError(msg) => Self::validation_error(msg),
            BlogServiceError::Conflict(msg) => Self::conflict(msg),
            BlogServiceError::Policy(e) => e.into(),
            BlogServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound(_) => Self::not_found("Post not found"),
            PostServiceError::ValidationError(msg) => Self::validation_error(msg),
            PostServiceError::Policy(e) => e.into(),
            PostServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(_) => Self::not_found("Tag not found"),
            TagServiceError::ValidationError(msg) => Self::validation_error(msg),
            TagServiceError::Conflict(msg) => Self::conflict(format!("Tag already exists: {}", msg)),
            TagServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

/// Extract the API token from the `Authorization` header.
///
/// Accepts the `Token <key>` scheme and `Bearer <key>`; the scheme name is
/// case-insensitive.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();

    let known_scheme = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known_scheme && !key.is_empty()).then(|| key.to_string())
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))?;

    let user = state
        .user_service
        .validate_token(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token."))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// A request without a token stays anonymous. A token that is presented but
/// unknown or revoked is rejected rather than downgraded to anonymous.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(request.headers()) {
        let user = state
            .user_service
            .validate_token(&token)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Rejected unknown API token");
                ApiError::unauthorized("Invalid token.")
            })?;
        request.extensions_mut().insert(AuthenticatedUser(user));
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}

/// The acting user, anonymous when no token was presented
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|user| Actor::User(user.0.clone()))
            .unwrap_or_default())
    }
}
