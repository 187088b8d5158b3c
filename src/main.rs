//! Medpost - backend for a medical expert content platform

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medpost::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxDirectionRepository, SqlxOriginRepository, SqlxPostRepository,
            SqlxPostTypeRepository, SqlxTagRepository, SqlxUserRepository,
        },
    },
    services::{
        direction::{spawn_status_refresh_job, DirectionService},
        post::PostService,
        post_type::PostTypeService,
        RoleAccessPolicy,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medpost=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Medpost service...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let post_repo = SqlxPostRepository::shared(pool.clone());
    let direction_repo = SqlxDirectionRepository::shared(pool.clone());
    let post_type_repo = SqlxPostTypeRepository::shared(pool.clone());
    let tag_repo = SqlxTagRepository::shared(pool.clone());
    let origin_repo = SqlxOriginRepository::shared(pool.clone());
    let user_repo = SqlxUserRepository::shared(pool.clone());

    // Initialize services
    let post_service = Arc::new(PostService::new(
        post_repo,
        direction_repo.clone(),
        post_type_repo.clone(),
        tag_repo,
        origin_repo,
        Arc::new(RoleAccessPolicy),
    ));
    let direction_service = Arc::new(DirectionService::new(direction_repo));
    let post_type_service = Arc::new(PostTypeService::new(post_type_repo));

    // Periodic recomputation of the derived direction doctor status
    let refresh_period =
        Duration::from_secs(config.scheduler.direction_refresh_hours * 60 * 60);
    spawn_status_refresh_job(direction_service.clone(), refresh_period);
    tracing::info!(
        "Direction status refresh scheduled every {} hour(s)",
        config.scheduler.direction_refresh_hours
    );

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        post_service,
        direction_service,
        post_type_service,
        user_repo,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
