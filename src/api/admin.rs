//! Admin API endpoints for posts
//!
//! JSON counterpart of the post admin form. All routes sit behind
//! `require_auth`; listings use the admin scope, where regular users only see
//! posts on their own blog.
//!
//! - GET /api/v1/admin/posts - changelist
//! - GET /api/v1/admin/posts/form - add form: read-only fields, blog choices
//! - GET /api/v1/admin/posts/{id}/form - change form
//! - POST /api/v1/admin/posts - add
//! - PUT /api/v1/admin/posts/{id} - change
//! - DELETE /api/v1/admin/posts/{id} - delete

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::PostWithTags;
use crate::policy::Actor;
use crate::services::{AdminPostForm, AdminPostInput};

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(add_post))
        .route("/posts/form", get(add_form))
        .route("/posts/{id}", axum::routing::put(change_post).delete(delete_post))
        .route("/posts/{id}/form", get(change_form))
}

/// GET /api/v1/admin/posts
async fn list_posts(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<PostWithTags>>, ApiError> {
    Ok(Json(state.post_service.admin_list(&actor).await?))
}

/// GET /api/v1/admin/posts/form
async fn add_form(State(state): State<AppState>, actor: Actor) -> Result<Json<AdminPostForm>, ApiError> {
    Ok(Json(state.post_service.admin_form(&actor, None).await?))
}

/// GET /api/v1/admin/posts/{id}/form
async fn change_form(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Json<AdminPostForm>, ApiError> {
    Ok(Json(state.post_service.admin_form(&actor, Some(id)).await?))
}

/// POST /api/v1/admin/posts
async fn add_post(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<AdminPostInput>,
) -> Result<(StatusCode, Json<PostWithTags>), ApiError> {
    let post = state.post_service.save_admin(&actor, None, body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/v1/admin/posts/{id}
async fn change_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<AdminPostInput>,
) -> Result<Json<PostWithTags>, ApiError> {
    Ok(Json(state.post_service.save_admin(&actor, Some(id), body).await?))
}

/// DELETE /api/v1/admin/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.admin_destroy(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
