//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::guard::{ACCESS_TOKEN_COOKIE, AuthUser, REFRESH_TOKEN_COOKIE, require_access_token};
use common::jwt::TokenPair;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::AuthError, manager::SignedIn, models::PublicUser};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request for token refresh, for clients that cannot send the cookie
#[derive(Deserialize, Default)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// Request for updating the current user
#[derive(Deserialize)]
pub struct UpdateCurrentUserRequest {
    #[serde(alias = "avatarImage")]
    pub avatar_image: String,
}

/// Response for register and login. The refresh token travels only in its cookie.
#[derive(Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Response for token refresh
#[derive(Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/users/logout", post(logout))
        .route(
            "/api/v1/users/me",
            get(current_user).patch(update_current_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            require_access_token,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/users/register", post(register))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/refresh-token", post(refresh_token))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Registration request");

    let signed_in = state
        .session_manager
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    let jar = with_session_cookies(&state, jar, &signed_in.tokens);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(session_response(&state, &signed_in)),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Login request");

    let signed_in = state
        .session_manager
        .login(&payload.email, &payload.password)
        .await?;

    let jar = with_session_cookies(&state, jar, &signed_in.tokens);
    Ok((
        StatusCode::OK,
        jar,
        Json(session_response(&state, &signed_in)),
    ))
}

/// Refresh token endpoint. Reads the `refreshToken` cookie, then the body.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshTokenRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Token refresh request");

    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            payload
                .and_then(|Json(body)| body.refresh_token)
                .filter(|token| !token.is_empty())
        })
        .ok_or(AuthError::TokenInvalid)?;

    let tokens = state.session_manager.refresh(&presented).await?;

    let response = RefreshTokenResponse {
        access_token: tokens.access_token.clone(),
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };
    let jar = with_session_cookies(&state, jar, &tokens);

    Ok((StatusCode::OK, jar, Json(response)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    state.session_manager.logout(user.id).await?;

    // Expire both cookies with the attributes they were set with
    let jar = jar
        .add(session_cookie(
            ACCESS_TOKEN_COOKIE,
            String::new(),
            time::Duration::ZERO,
        ))
        .add(session_cookie(
            REFRESH_TOKEN_COOKIE,
            String::new(),
            time::Duration::ZERO,
        ));

    Ok((
        StatusCode::OK,
        jar,
        Json(serde_json::json!({"message": "User logged out"})),
    ))
}

/// Current user endpoint
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state.session_manager.current_user(user.id).await?;
    Ok(Json(serde_json::json!({ "user": PublicUser::from(&user) })))
}

/// Update the current user's avatar
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateCurrentUserRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .session_manager
        .update_avatar(user.id, &payload.avatar_image)
        .await?;
    Ok(Json(serde_json::json!({ "user": PublicUser::from(&user) })))
}

fn session_response(state: &AppState, signed_in: &SignedIn) -> SessionResponse {
    SessionResponse {
        user: PublicUser::from(&signed_in.user),
        access_token: signed_in.tokens.access_token.clone(),
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    }
}

fn with_session_cookies(state: &AppState, jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    let max_age = time::Duration::seconds(
        i64::try_from(state.jwt_service.refresh_token_expiry()).unwrap_or(i64::MAX),
    );
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        max_age,
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        max_age,
    ))
}

fn session_cookie(name: &'static str, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(max_age)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tests::test_manager;
    use axum::{
        body::Body,
        http::{Request, Response, header},
    };
    use common::clock::ManualClock;
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> Router {
        let manager = test_manager();
        let jwt_service = crate::manager::tests::test_jwt(&ManualClock::starting_now());
        create_router(AppState {
            session_manager: manager,
            jwt_service,
        })
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{}=", name)))
            .and_then(|value| value.split(';').next())
            .map(|pair| pair[name.len() + 1..].to_string())
    }

    fn set_cookie_header(response: &Response<Body>, name: &str) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{}=", name)))
            .map(str::to_string)
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router) -> Response<Body> {
        app.clone()
            .oneshot(json_request(
                "/api/v1/users/register",
                serde_json::json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "password": "correct horse"
                }),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_sets_secure_cookies() {
        let app = test_app();
        let response = register(&app).await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let refresh_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("refreshToken="))
            .unwrap()
            .to_string();
        assert!(refresh_cookie.contains("HttpOnly"));
        assert!(refresh_cookie.contains("Secure"));
        assert!(refresh_cookie.contains("SameSite=None"));
        assert!(refresh_cookie.contains("Path=/"));
        assert!(cookie_value(&response, "accessToken").is_some());

        let body = body_json(response).await;
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert!(body["user"].get("password_hash").is_none());
        assert!(body.get("refresh_token").is_none());
    }

    #[tokio::test]
    async fn test_login_failure_is_generic() {
        let app = test_app();
        register(&app).await;

        let wrong_password = app
            .clone()
            .oneshot(json_request(
                "/api/v1/users/login",
                serde_json::json!({"email": "ada@example.com", "password": "nope nope"}),
            ))
            .await
            .unwrap();
        let unknown = app
            .clone()
            .oneshot(json_request(
                "/api/v1/users/login",
                serde_json::json!({"email": "bob@example.com", "password": "nope nope"}),
            ))
            .await
            .unwrap();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong_password).await, body_json(unknown).await);
    }

    #[tokio::test]
    async fn test_refresh_via_cookie_rotates() {
        let app = test_app();
        let registered = register(&app).await;
        let old = cookie_value(&registered, "refreshToken").unwrap();

        let refresh = |token: String| {
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/refresh-token")
                .header(header::COOKIE, format!("refreshToken={}", token))
                .body(Body::empty())
                .unwrap()
        };

        let rotated = app.clone().oneshot(refresh(old.clone())).await.unwrap();
        assert_eq!(rotated.status(), StatusCode::OK);
        let new = cookie_value(&rotated, "refreshToken").unwrap();
        assert_ne!(new, old);

        let replay = app.clone().oneshot(refresh(old)).await.unwrap();
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(replay).await["kind"], "token_revoked");
    }

    #[tokio::test]
    async fn test_refresh_via_body() {
        let app = test_app();
        let registered = register(&app).await;
        let token = cookie_value(&registered, "refreshToken").unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "/api/v1/users/refresh-token",
                serde_json::json!({ "refresh_token": token }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["access_token"].is_string());
    }

    #[tokio::test]
    async fn test_empty_refresh_cookie_falls_back_to_body() {
        let app = test_app();
        let registered = register(&app).await;
        let token = cookie_value(&registered, "refreshToken").unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/users/refresh-token")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::COOKIE, "refreshToken=")
                    .body(Body::from(
                        serde_json::json!({ "refresh_token": token }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn update_me(access: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("PATCH")
            .uri("/api/v1/users/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", access))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_current_user_avatar() {
        let app = test_app();
        let registered = register(&app).await;
        let access = cookie_value(&registered, "accessToken").unwrap();

        let response = app
            .clone()
            .oneshot(update_me(
                &access,
                serde_json::json!({ "avatarImage": "/avatars/avatar3.svg" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["user"]["avatar_image"],
            "/avatars/avatar3.svg"
        );

        let me = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            body_json(me).await["user"]["avatar_image"],
            "/avatars/avatar3.svg"
        );
    }

    #[tokio::test]
    async fn test_update_current_user_rejects_unknown_avatar() {
        let app = test_app();
        let registered = register(&app).await;
        let access = cookie_value(&registered, "accessToken").unwrap();

        let response = app
            .clone()
            .oneshot(update_me(
                &access,
                serde_json::json!({ "avatar_image": "/avatars/avatar99.svg" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "validation");
    }

    #[tokio::test]
    async fn test_update_current_user_requires_access_token() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/api/v1/users/me")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "avatar_image": "/avatars/avatar1.svg" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_unauthorized() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/users/refresh-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["kind"], "token_invalid");
    }

    #[tokio::test]
    async fn test_logout_then_refresh_fails_but_access_token_lives_on() {
        let app = test_app();
        let registered = register(&app).await;
        let access = cookie_value(&registered, "accessToken").unwrap();
        let refresh = cookie_value(&registered, "refreshToken").unwrap();
        let cookies = format!("accessToken={}; refreshToken={}", access, refresh);

        let logout = || {
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/logout")
                .header(header::COOKIE, cookies.clone())
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(logout()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        for name in ["accessToken", "refreshToken"] {
            assert_eq!(cookie_value(&response, name).as_deref(), Some(""));
            let cleared = set_cookie_header(&response, name).unwrap();
            assert!(cleared.contains("Max-Age=0"));
            assert!(cleared.contains("HttpOnly"));
            assert!(cleared.contains("Secure"));
            assert!(cleared.contains("SameSite=None"));
            assert!(cleared.contains("Path=/"));
        }

        // Second logout is a no-op success.
        let again = app.clone().oneshot(logout()).await.unwrap();
        assert_eq!(again.status(), StatusCode::OK);

        let refreshed = app
            .clone()
            .oneshot(json_request(
                "/api/v1/users/refresh-token",
                serde_json::json!({ "refresh_token": refresh }),
            ))
            .await
            .unwrap();
        assert_eq!(refreshed.status(), StatusCode::UNAUTHORIZED);

        let me = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", access))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(body_json(me).await["user"]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_me_requires_access_token() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
