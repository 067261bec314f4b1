//! Tag API endpoints
//!
//! - GET /api/v1/tags, GET /api/v1/tags/{id} - public
//! - POST /api/v1/tags, PUT|DELETE /api/v1/tags/{id} - any authenticated user

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Tag, TagInput};
use crate::policy::{Action, Actor, PermissionPolicy};

/// Build the tag router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", get(get_tag).put(update_tag).delete(delete_tag))
}

fn check(action: Action, actor: &Actor) -> Result<(), ApiError> {
    PermissionPolicy::public_read_only().check(action, actor)?;
    Ok(())
}

/// GET /api/v1/tags
async fn list_tags(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<Tag>>, ApiError> {
    check(Action::List, &actor)?;
    Ok(Json(state.tag_service.list().await?))
}

/// GET /api/v1/tags/{id}
async fn get_tag(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Json<Tag>, ApiError> {
    check(Action::Retrieve, &actor)?;
    Ok(Json(state.tag_service.get(id).await?))
}

/// POST /api/v1/tags
async fn create_tag(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<TagInput>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    check(Action::Create, &actor)?;
    Ok((StatusCode::CREATED, Json(state.tag_service.create(body).await?)))
}

/// PUT /api/v1/tags/{id}
async fn update_tag(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    check(Action::Update, &actor)?;
    Ok(Json(state.tag_service.update(id, body).await?))
}

/// DELETE /api/v1/tags/{id}
async fn delete_tag(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check(Action::Destroy, &actor)?;
    state.tag_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
