//! In-memory user store for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser, now: DateTime<Utc>) -> DatabaseResult<Option<User>> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Ok(None);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            avatar_image: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn update_avatar(
        &self,
        id: Uuid,
        avatar_image: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<User>> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        user.avatar_image = Some(avatar_image.to_string());
        user.updated_at = now;
        Ok(Some(user.clone()))
    }
}
