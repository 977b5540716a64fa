//! Bearer token authentication for the `/api` routes.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use concierge_core::auth::SessionToken;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Signed-in user attached to the request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub username: String,
    pub token_id: Uuid,
}

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (error, code) = match self {
            AuthError::MissingToken => ("Missing authentication token", "MISSING_TOKEN"),
            AuthError::InvalidToken => ("Invalid authentication token", "INVALID_TOKEN"),
            AuthError::ExpiredToken => ("Token has expired", "EXPIRED_TOKEN"),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        });

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Authentication middleware for axum
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token_str = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token_str = token_str.trim_start_matches("Bearer ").trim();
    let token_bytes = SessionToken::decode(token_str).map_err(|_| AuthError::InvalidToken)?;

    let token = state
        .tokens
        .lookup(&token_bytes)
        .await
        .ok_or(AuthError::InvalidToken)?;

    if token.is_expired() {
        state.tokens.revoke(token.token_id).await;
        state.release_if_idle(&token.username).await;
        debug!(username = %token.username, "Rejected expired token");
        return Err(AuthError::ExpiredToken);
    }

    request.extensions_mut().insert(AuthContext {
        username: token.username,
        token_id: token.token_id,
    });

    Ok(next.run(request).await)
}
