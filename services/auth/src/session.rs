//! Single-slot session storage
//!
//! Each subject has at most one live refresh token, stored under
//! `session:{subject_id}`. Writing the slot invalidates whatever refresh token
//! was there before; clearing it invalidates all of them. The slot is read
//! and written without a cross-request lock: two concurrent rotations of the
//! same token both succeed and the later write wins.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Errors raised by a session store backend
#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Per-subject slot holding the current refresh token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current refresh token for the subject, if any
    async fn get(&self, subject: Uuid) -> Result<Option<String>, SessionStoreError>;

    /// Replace the subject's refresh token
    async fn put(
        &self,
        subject: Uuid,
        refresh_token: &str,
        ttl_seconds: u64,
    ) -> Result<(), SessionStoreError>;

    /// Empty the slot. Succeeds when it is already empty.
    async fn clear(&self, subject: Uuid) -> Result<(), SessionStoreError>;
}

fn session_key(subject: Uuid) -> String {
    format!("session:{}", subject)
}

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Self {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        RedisConfig { url }
    }
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
}

impl RedisSessionStore {
    /// Create a store for the configured Redis
    pub fn new(config: &RedisConfig) -> Result<Self, SessionStoreError> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, SessionStoreError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool, SessionStoreError> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, subject: Uuid) -> Result<Option<String>, SessionStoreError> {
        let mut conn = self.connection().await?;
        let token: Option<String> = conn.get(session_key(subject)).await?;
        Ok(token)
    }

    async fn put(
        &self,
        subject: Uuid,
        refresh_token: &str,
        ttl_seconds: u64,
    ) -> Result<(), SessionStoreError> {
        let mut conn = self.connection().await?;
        // The slot never outlives the token it holds.
        let _: () = conn
            .set_ex(session_key(subject), refresh_token, ttl_seconds)
            .await?;
        Ok(())
    }

    async fn clear(&self, subject: Uuid) -> Result<(), SessionStoreError> {
        let mut conn = self.connection().await?;
        let _: u64 = conn.del(session_key(subject)).await?;
        Ok(())
    }
}

/// In-memory session store for tests. TTLs are not enforced; an expired
/// token already fails signature/expiry verification before the slot is read.
#[cfg(test)]
#[derive(Default)]
pub struct InMemorySessionStore {
    slots: tokio::sync::Mutex<std::collections::HashMap<Uuid, String>>,
}

#[cfg(test)]
#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, subject: Uuid) -> Result<Option<String>, SessionStoreError> {
        Ok(self.slots.lock().await.get(&subject).cloned())
    }

    async fn put(
        &self,
        subject: Uuid,
        refresh_token: &str,
        _ttl_seconds: u64,
    ) -> Result<(), SessionStoreError> {
        self.slots
            .lock()
            .await
            .insert(subject, refresh_token.to_string());
        Ok(())
    }

    async fn clear(&self, subject: Uuid) -> Result<(), SessionStoreError> {
        self.slots.lock().await.remove(&subject);
        Ok(())
    }
}
