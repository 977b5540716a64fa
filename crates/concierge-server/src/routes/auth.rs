//! Login, registration and logout.

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, core_error};
use crate::middleware::AuthContext;
use crate::state::AppState;

/// Routes reachable without a token
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

async fn issue_token(state: &AppState, username: &str, display_name: String) -> LoginResponse {
    let token = state.sign_in(username).await;
    LoginResponse {
        token: token.encode(),
        username: username.to_string(),
        display_name,
        expires_at: token.expires_at.map(DateTime::<Utc>::from),
    }
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .authenticate(input.username.trim(), &input.password)
        .map_err(core_error)?;

    Ok(Json(issue_token(&state, &user.username, user.display_name).await))
}

/// Create an account and sign it in.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let user = state
        .users
        .create_user(&input.username, &input.password, input.display_name.as_deref())
        .map_err(core_error)?;

    let response = issue_token(&state, &user.username, user.display_name).await;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Revoke the presented token. The cached session goes with the user's last token.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> StatusCode {
    state.tokens.revoke(auth.token_id).await;
    state.release_if_idle(&auth.username).await;
    info!(username = %auth.username, "User logged out");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_login_logout() {
        let app = TestApp::new();

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"username": "Alice", "password": "secret", "display_name": "Alice L"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["display_name"], "Alice L");

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "alice", "password": "secret"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        assert!(body["expires_at"].is_string());

        let (status, _) = app.send("POST", "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.send("GET", "/api/state", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let app = TestApp::new();
        app.login("alice").await;

        let (status, _) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "alice", "password": "wrong"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_conflicts_and_validation() {
        let app = TestApp::new();
        app.login("alice").await;

        let (status, _) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"username": "alice", "password": "another"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"username": "bo", "password": "secret"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
