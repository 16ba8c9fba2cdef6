//! Service bootstrap: listener configuration, CORS and logging

use anyhow::Result;
use axum::http::{HeaderValue, Method, header};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

/// Listener and CORS configuration for one service
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the service binds to
    pub bind_address: SocketAddr,
    /// Origin allowed to call the service with credentials
    pub cors_origin: String,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `bind_var` (e.g. `AUTH_BIND_ADDRESS`): listen address (default: `default_bind`)
    /// - `CORS_ORIGIN`: allowed origin (default: "http://localhost:5173")
    pub fn from_env(bind_var: &str, default_bind: &str) -> Result<Self> {
        let bind_address = std::env::var(bind_var)
            .unwrap_or_else(|_| default_bind.to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", bind_var, e))?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(ServerConfig {
            bind_address,
            cors_origin,
        })
    }

    /// CORS layer allowing credentialed requests from the configured origin
    pub fn cors_layer(&self) -> Result<CorsLayer> {
        let origin: HeaderValue = self
            .cors_origin
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid CORS_ORIGIN: {}", e))?;

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
    }
}

/// Install the global tracing subscriber, honouring `RUST_LOG` (default: info)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
