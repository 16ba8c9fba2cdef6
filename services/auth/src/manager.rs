//! Session lifecycle: register, login, refresh (rotation), logout
//!
//! Per subject the lifecycle is `LoggedOut -> Active -> Active' -> LoggedOut`,
//! where `Active'` is the same state holding a rotated refresh token. A
//! refresh token is honored only while it is the exact value held in the
//! subject's slot, which is what makes logout and rotation revoke it.

use common::clock::Clock;
use common::jwt::{JwtService, TokenPair};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::models::{NewUser, User};
use crate::password::CredentialHasher;
use crate::repositories::UserStore;
use crate::session::SessionStore;
use crate::validation::{
    normalize_email, validate_avatar, validate_email, validate_name, validate_password,
};

/// A subject that just registered or logged in, with its new tokens
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub tokens: TokenPair,
}

/// Session manager for handling user sessions
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    jwt_service: Arc<JwtService>,
    hasher: CredentialHasher,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        jwt_service: Arc<JwtService>,
        hasher: CredentialHasher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            sessions,
            jwt_service,
            hasher,
            clock,
        }
    }

    /// Create an account and open a session for it
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignedIn, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);

        validate_name(name).map_err(AuthError::Validation)?;
        validate_email(&email).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;

        let password_hash = self.hasher.hash(password)?;
        let new_user = NewUser {
            name: name.to_string(),
            email,
            password_hash,
        };

        let user = self
            .users
            .create(new_user, self.clock.now())
            .await?
            .ok_or_else(|| AuthError::Conflict("User with same email already exists".to_string()))?;

        info!("Registered user: {}", user.id);

        let tokens = self.start_session(user.id).await?;
        Ok(SignedIn { user, tokens })
    }

    /// Verify credentials and open a session, replacing any previous one
    pub async fn login(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Provide both email and password".to_string(),
            ));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("Login rejected: no user with that email");
            return Err(AuthError::Authentication);
        };

        if !self.hasher.verify(&user.password_hash, password)? {
            warn!("Login rejected for user {}: wrong password", user.id);
            return Err(AuthError::Authentication);
        }

        let tokens = self.start_session(user.id).await?;
        info!("User logged in: {}", user.id);

        Ok(SignedIn { user, tokens })
    }

    /// Exchange the current refresh token for a new pair (rotation)
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.jwt_service.verify_refresh(refresh_token).map_err(|e| {
            warn!(kind = e.kind(), "Refresh rejected: {}", e);
            AuthError::TokenInvalid
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        let current = self.sessions.get(user.id).await?;
        if current.as_deref() != Some(refresh_token) {
            warn!("Refresh rejected for user {}: token is not the current one", user.id);
            return Err(AuthError::TokenRevoked);
        }

        let tokens = self.start_session(user.id).await?;
        info!("Rotated refresh token for user: {}", user.id);

        Ok(tokens)
    }

    /// Empty the subject's slot. Idempotent.
    ///
    /// Access tokens already issued stay valid until they expire.
    pub async fn logout(&self, subject: Uuid) -> Result<(), AuthError> {
        self.sessions.clear(subject).await?;
        info!("User logged out: {}", subject);
        Ok(())
    }

    /// Load the subject an access token was issued for
    pub async fn current_user(&self, subject: Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(subject)
            .await?
            .ok_or(AuthError::TokenInvalid)
    }

    /// Pick one of the bundled avatars for the subject
    pub async fn update_avatar(
        &self,
        subject: Uuid,
        avatar_image: &str,
    ) -> Result<User, AuthError> {
        let avatar_image = avatar_image.trim();
        validate_avatar(avatar_image).map_err(AuthError::Validation)?;

        let user = self
            .users
            .update_avatar(subject, avatar_image, self.clock.now())
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        info!("Updated avatar for user: {}", user.id);
        Ok(user)
    }

    async fn start_session(&self, subject: Uuid) -> Result<TokenPair, AuthError> {
        let tokens = self.jwt_service.issue_pair(subject)?;
        self.sessions
            .put(
                subject,
                &tokens.refresh_token,
                self.jwt_service.refresh_token_expiry(),
            )
            .await?;
        Ok(tokens)
    }
}
