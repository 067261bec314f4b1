//! Blog API endpoints
//!
//! - GET /api/v1/blogs, GET /api/v1/blogs/{id} - public
//! - POST /api/v1/blogs - authenticated; the caller becomes the owner
//! - PUT|PATCH|DELETE /api/v1/blogs/{id} - owner or superuser

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Blog, CreateBlogInput, UpdateBlogInput};
use crate::policy::{Action, Actor, PermissionPolicy};

/// Build the blog router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blogs).post(create_blog))
        .route(
            "/{id}",
            get(get_blog)
                .put(update_blog)
                .patch(partial_update_blog)
                .delete(delete_blog),
        )
}

fn check(action: Action, actor: &Actor) -> Result<(), ApiError> {
    PermissionPolicy::blog_owner().check(action, actor)?;
    Ok(())
}

/// GET /api/v1/blogs
async fn list_blogs(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<Blog>>, ApiError> {
    check(Action::List, &actor)?;
    Ok(Json(state.blog_service.list().await?))
}

/// GET /api/v1/blogs/{id}
async fn get_blog(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Json<Blog>, ApiError> {
    check(Action::Retrieve, &actor)?;
    Ok(Json(state.blog_service.get(id).await?))
}

/// POST /api/v1/blogs
async fn create_blog(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateBlogInput>,
) -> Result<(StatusCode, Json<Blog>), ApiError> {
    check(Action::Create, &actor)?;
    let blog = state.blog_service.create(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

/// PUT /api/v1/blogs/{id}
async fn update_blog(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBlogInput>,
) -> Result<Json<Blog>, ApiError> {
    check(Action::Update, &actor)?;
    Ok(Json(state.blog_service.update(&actor, id, body).await?))
}

/// PATCH /api/v1/blogs/{id}
async fn partial_update_blog(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBlogInput>,
) -> Result<Json<Blog>, ApiError> {
    check(Action::PartialUpdate, &actor)?;
    Ok(Json(state.blog_service.update(&actor, id, body).await?))
}

/// DELETE /api/v1/blogs/{id}
async fn delete_blog(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check(Action::Destroy, &actor)?;
    state.blog_service.destroy(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
