//! Custom error types for the common library
//!
//! This module defines the storage and token errors shared by both
//! services. Each service maps them onto its own HTTP-facing error.

use sqlx::Error as SqlxError;
use thiserror::Error;

use crate::jwt::TokenType;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[from] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised while signing or verifying tokens
#[derive(Error, Debug)]
pub enum TokenError {
    /// Signing failed. Fatal to the calling operation.
    #[error("Token generation error: {0}")]
    Generation(#[source] jsonwebtoken::errors::Error),

    /// Bad signature, malformed token or expired token
    #[error("Invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    /// Token verified but carries the other token type
    #[error("Expected a {expected:?} token")]
    WrongType { expected: TokenType },

    /// Issue time plus lifetime does not fit in a timestamp
    #[error("Token expiry out of range")]
    ExpiryOutOfRange,
}

impl TokenError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Generation(_) | TokenError::ExpiryOutOfRange => "token_generation",
            TokenError::Invalid(_) | TokenError::WrongType { .. } => "token_invalid",
        }
    }
}
