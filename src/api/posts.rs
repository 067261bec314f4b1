//! Post API endpoints
//!
//! - GET /api/v1/posts?blog_id= and GET /api/v1/posts/{id} - public, scoped
//!   to the caller's own posts when authenticated as a regular user
//! - POST /api/v1/posts - authenticated; lands on the caller's blog
//! - PUT|PATCH|DELETE /api/v1/posts/{id} - owner or superuser

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreatePostInput, PostWithTags, UpdatePostInput};
use crate::policy::{filter_posts_by_blog, viewset_post_scope, Action, Actor, PermissionPolicy, PostFilter};

/// Query parameters for the post list
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    /// Kept raw so a malformed id is reported as a validation error
    pub blog_id: Option<String>,
}

/// Build the post router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/{id}",
            get(get_post)
                .put(update_post)
                .patch(partial_update_post)
                .delete(delete_post),
        )
}

fn check(action: Action, actor: &Actor) -> Result<(), ApiError> {
    PermissionPolicy::public_read_only().check(action, actor)?;
    Ok(())
}

/// GET /api/v1/posts
async fn list_posts(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostWithTags>>, ApiError> {
    check(Action::List, &actor)?;

    let filter = filter_posts_by_blog(
        PostFilter::new(viewset_post_scope(&actor)),
        query.blog_id.as_deref(),
    )
    .map_err(ApiError::validation_error)?;

    Ok(Json(state.post_service.list(&filter).await?))
}

/// GET /api/v1/posts/{id}
async fn get_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Json<PostWithTags>, ApiError> {
    check(Action::Retrieve, &actor)?;
    Ok(Json(state.post_service.get(viewset_post_scope(&actor), id).await?))
}

/// POST /api/v1/posts
async fn create_post(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<PostWithTags>), ApiError> {
    check(Action::Create, &actor)?;
    let post = state.post_service.create(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/v1/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<PostWithTags>, ApiError> {
    check(Action::Update, &actor)?;
    Ok(Json(state.post_service.update(&actor, id, body).await?))
}

/// PATCH /api/v1/posts/{id}
async fn partial_update_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<PostWithTags>, ApiError> {
    check(Action::PartialUpdate, &actor)?;
    Ok(Json(state.post_service.update(&actor, id, body).await?))
}

/// DELETE /api/v1/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    check(Action::Destroy, &actor)?;
    state.post_service.destroy(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
