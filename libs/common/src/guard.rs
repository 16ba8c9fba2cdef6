//! Access-token guard for protected routes
//!
//! The guard only checks the access token's signature, expiry and type. It
//! never consults the session store, so logging out does not cut off an
//! access token that is already in a client's hands: it stays usable until
//! it expires (at most the configured access TTL). Only refresh is revoked
//! immediately.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::jwt::JwtService;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated subject, inserted into request extensions by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Rejection returned by [`require_access_token`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let message = match self {
            GuardRejection::MissingToken => "Unauthorized request",
            GuardRejection::InvalidToken => "Invalid access token",
        };

        let body = Json(serde_json::json!({
            "error": message,
            "kind": "token_invalid",
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Find the access token: the `accessToken` cookie first, then a bearer header
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Middleware validating the access token on every protected request
pub async fn require_access_token(
    State(jwt): State<Arc<JwtService>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let token = access_token_from_headers(req.headers()).ok_or(GuardRejection::MissingToken)?;

    let claims = jwt.verify_access(&token).map_err(|e| {
        warn!(kind = e.kind(), "Rejected access token: {}", e);
        GuardRejection::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}
