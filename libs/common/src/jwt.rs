//! JWT service for token generation and validation
//!
//! Access and refresh tokens are HS256 JWTs signed with two different
//! secrets and carrying a `token_type` claim. Verification here is
//! stateless: signature, expiry and token type only. Whether a refresh
//! token is still the current one for its subject is the auth service's
//! session store's business.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::TokenError;

/// Upper bound for either token lifetime: one year
pub const MAX_TOKEN_EXPIRY: u64 = 365 * 24 * 60 * 60;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Secret for signing refresh tokens
    pub refresh_secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCESS_TOKEN_SECRET`: Secret for access tokens (required)
    /// - `REFRESH_TOKEN_SECRET`: Secret for refresh tokens (required, must differ)
    /// - `ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        let config = JwtConfig {
            access_secret,
            refresh_secret,
            access_token_expiry,
            refresh_token_expiry,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.access_secret.trim().is_empty() || self.refresh_secret.trim().is_empty() {
            anyhow::bail!("Token secrets must not be empty");
        }
        if self.access_secret == self.refresh_secret {
            anyhow::bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }
        for (name, expiry) in [
            ("ACCESS_TOKEN_EXPIRY", self.access_token_expiry),
            ("REFRESH_TOKEN_EXPIRY", self.refresh_token_expiry),
        ] {
            if expiry == 0 || expiry > MAX_TOKEN_EXPIRY {
                anyhow::bail!(
                    "{} must be between 1 and {} seconds, got {}",
                    name,
                    MAX_TOKEN_EXPIRY,
                    expiry
                );
            }
        }
        Ok(())
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user) ID
    pub sub: Uuid,
    /// Unique token ID, so two tokens issued in the same second differ
    pub jti: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    config: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // A token is rejected from the second its `exp` is reached
        validation.leeway = 0;

        Ok(JwtService {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            config,
            clock,
        })
    }

    /// Generate an access token for a subject
    pub fn issue_access_token(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue(subject, TokenType::Access)
    }

    /// Generate a refresh token for a subject
    pub fn issue_refresh_token(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue(subject, TokenType::Refresh)
    }

    /// Generate both tokens for a subject
    pub fn issue_pair(&self, subject: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(subject)?,
            refresh_token: self.issue_refresh_token(subject)?,
        })
    }

    /// Validate an access token: signature, expiry and type only
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenType::Access)
    }

    /// Validate a refresh token's signature, expiry and type.
    ///
    /// This does not tell whether the token was revoked or rotated away.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, TokenType::Refresh)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }

    fn issue(&self, subject: Uuid, token_type: TokenType) -> Result<String, TokenError> {
        let now = self.clock.now().timestamp().max(0) as u64;
        let (key, ttl) = match token_type {
            TokenType::Access => (&self.access_encoding, self.config.access_token_expiry),
            TokenType::Refresh => (&self.refresh_encoding, self.config.refresh_token_expiry),
        };

        let claims = Claims {
            sub: subject,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now.checked_add(ttl).ok_or(TokenError::ExpiryOutOfRange)?,
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key).map_err(TokenError::Generation)
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let key = match expected {
            TokenType::Access => &self.access_decoding,
            TokenType::Refresh => &self.refresh_decoding,
        };

        let claims = decode::<Claims>(token, key, &self.validation)
            .map_err(TokenError::Invalid)?
            .claims;

        if claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }
}
