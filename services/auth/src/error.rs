//! Error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::{DatabaseError, TokenError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::session::SessionStoreError;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Email already registered
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown email or wrong password. Both render the same message.
    #[error("Invalid email or password")]
    Authentication,

    /// Missing, malformed, expired or wrong-type token
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// Refresh token verified but is not the subject's current one
    #[error("Refresh token has been revoked")]
    TokenRevoked,

    /// Signing failed
    #[error("Token generation error: {0}")]
    TokenGeneration(#[source] TokenError),

    /// User store failure
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Session slot failure
    #[error("Session store error: {0}")]
    SessionStore(#[from] SessionStoreError),

    /// Anything else internal (password hashing, ...)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation",
            AuthError::Conflict(_) => "conflict",
            AuthError::Authentication => "authentication",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenRevoked => "token_revoked",
            AuthError::TokenGeneration(_) => "token_generation",
            AuthError::Storage(_) | AuthError::SessionStore(_) | AuthError::Internal(_) => {
                "internal"
            }
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Generation(_) | TokenError::ExpiryOutOfRange => {
                AuthError::TokenGeneration(err)
            }
            TokenError::Invalid(_) | TokenError::WrongType { .. } => AuthError::TokenInvalid,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, error_message) = match &self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AuthError::Authentication | AuthError::TokenInvalid | AuthError::TokenRevoked => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AuthError::TokenGeneration(_) => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error while generating access and refresh tokens".to_string(),
                )
            }
            AuthError::Storage(_) | AuthError::SessionStore(_) | AuthError::Internal(_) => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
