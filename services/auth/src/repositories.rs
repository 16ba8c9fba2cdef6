//! User storage port and its implementations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, User};

#[cfg(test)]
pub mod memory;
pub mod user;

pub use user::UserRepository;

/// Subject lookups needed by the session lifecycle
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Returns `None` when the email is already taken.
    async fn create(&self, new_user: NewUser, now: DateTime<Utc>) -> DatabaseResult<Option<User>>;

    /// Find a user by (normalized) email
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// Set the user's avatar and stamp `updated_at` with `now`
    async fn update_avatar(
        &self,
        id: Uuid,
        avatar_image: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<User>>;
}
