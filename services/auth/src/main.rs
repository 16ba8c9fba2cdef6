use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod error;
mod manager;
mod models;
mod password;
mod repositories;
mod routes;
mod session;
mod validation;

use common::{
    clock::{Clock, SystemClock},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    jwt::{JwtConfig, JwtService},
    server::{ServerConfig, init_tracing},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    manager::SessionManager,
    password::CredentialHasher,
    repositories::UserRepository,
    session::{RedisConfig, RedisSessionStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session_manager: SessionManager,
    pub jwt_service: Arc<JwtService>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = Arc::new(JwtService::new(jwt_config, clock.clone())?);

    // Initialize the Redis-backed session slots
    let session_store = RedisSessionStore::new(&RedisConfig::from_env())?;
    if !session_store.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    let session_manager = SessionManager::new(
        Arc::new(UserRepository::new(pool)),
        Arc::new(session_store),
        jwt_service.clone(),
        CredentialHasher::default(),
        clock,
    );

    let app_state = AppState {
        session_manager,
        jwt_service,
    };

    let server = ServerConfig::from_env("AUTH_BIND_ADDRESS", "0.0.0.0:3000")?;
    let app = routes::create_router(app_state)
        .layer(server.cors_layer()?)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(server.bind_address).await?;
    info!("Authentication service listening on {}", server.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
