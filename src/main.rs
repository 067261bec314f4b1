//! blogcms - A multi-user blog content API

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogcms::{
    api::{self, AppState},
    config::{BootstrapSuperuser, Config},
    db,
    services::{RegisterInput, UserService, UserServiceError},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogcms=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting blogcms...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let pending = db::migrations::pending_count(&pool).await?;
    if pending > 0 {
        tracing::info!("{} pending database migrations", pending);
    }
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    let state = AppState::new(pool.clone());

    if let Some(bootstrap) = &config.auth.bootstrap_superuser {
        bootstrap_superuser(&state.user_service, bootstrap).await?;
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Database connections closed");

    Ok(())
}

/// Create the configured superuser unless the username is already taken
async fn bootstrap_superuser(users: &UserService, bootstrap: &BootstrapSuperuser) -> Result<()> {
    let input = RegisterInput::new(
        bootstrap.username.clone(),
        bootstrap.email.clone(),
        bootstrap.password.clone(),
    );
    match users.create_superuser(input).await {
        Ok(user) => tracing::info!("Created superuser '{}'", user.username),
        Err(UserServiceError::UserExists(_)) => {
            tracing::info!("Superuser '{}' already exists", bootstrap.username)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
