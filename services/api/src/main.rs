use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod error;
mod models;
mod repositories;
mod routes;
mod state;
mod summarizer;
mod summary;

use common::{
    clock::{Clock, SystemClock},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    jwt::{JwtConfig, JwtService},
    server::{ServerConfig, init_tracing},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    repositories::{NoteRepository, NoteStore, TaskRepository, TaskStore},
    state::AppState,
    summarizer::{HttpSummarizer, SummarizerConfig},
    summary::SummaryService,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Access tokens are verified locally; no session store lookup
    let jwt_service = Arc::new(JwtService::new(JwtConfig::from_env()?, clock.clone())?);

    let summarizer_config = SummarizerConfig::from_env()?;
    let timeout = summarizer_config.timeout;
    let summarizer = Arc::new(HttpSummarizer::new(summarizer_config)?);

    let notes: Arc<dyn NoteStore> = Arc::new(NoteRepository::new(pool.clone()));
    let tasks: Arc<dyn TaskStore> = Arc::new(TaskRepository::new(pool));
    let summaries = SummaryService::new(
        notes.clone(),
        tasks.clone(),
        summarizer,
        clock.clone(),
        timeout,
    );

    let app_state = AppState {
        notes,
        tasks,
        summaries,
        jwt_service,
        clock,
    };

    // Start the web server
    let server = ServerConfig::from_env("API_BIND_ADDRESS", "0.0.0.0:3001")?;
    let app = routes::create_router(app_state)
        .layer(server.cors_layer()?)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(server.bind_address).await?;
    info!("API service listening on {}", server.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
