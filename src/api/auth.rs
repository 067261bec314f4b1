//! Authentication API endpoints
//!
//! - POST /api/v1/auth/register - Create an account
//! - POST /api/v1/auth/login - Exchange credentials for the user's API token
//! - POST /api/v1/auth/logout - Revoke the caller's token
//! - GET /api/v1/auth/me - Current user

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::User;
use crate::services::user::RegisterInput;

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_superuser: user.is_superuser,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(body).await?;
    let token = state.user_service.create_token(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: token.key,
            user: user.into(),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Every failure answers 401 `INVALID_CREDENTIALS` with the same message.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(&body.username, &body.password)
        .await?;
    let token = state.user_service.create_token(&user).await?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(AuthResponse {
        token: token.key,
        user: user.into(),
    }))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_token(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
async fn get_current_user(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserResponse> {
    Json(user.into())
}
