//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1`:
//! - `/auth` - token login, logout, registration
//! - `/blogs`, `/posts`, `/tags` - public reads, authenticated writes
//! - `/admin/posts` - post admin form, authentication required
//!
//! Every request first passes `optional_auth`, which turns a valid token into
//! the acting user and rejects an invalid one; handlers then apply the rules
//! in [`crate::policy`].

pub mod admin;
pub mod auth;
pub mod blogs;
pub mod middleware;
pub mod posts;
pub mod tags;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Routes that need a logged-in user
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes; write actions are gated per handler
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::public_router())
        .nest("/blogs", blogs::router())
        .nest("/posts", posts::router())
        .nest("/tags", tags::router())
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if cors_origin == "*" {
        return cors.allow_origin(Any);
    }
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(cors_origin, "Invalid CORS origin, cross-origin requests disabled");
            cors
        }
    }
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> StatusCode {
    match state.pool.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
