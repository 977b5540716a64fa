//! API route modules.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod health;
pub mod landing;
pub mod memory;
pub mod profile;
pub mod user_state;

use axum::{Router, http::StatusCode, middleware, routing::get};
use concierge_core::Error;
use concierge_core::storage::StateStore;
use concierge_core::types::UserState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::middleware::auth_middleware;
use crate::state::{AppState, UserSession};

/// Error half of every handler result
pub type ApiError = (StatusCode, String);

/// Map a core error to a status code and message.
pub fn core_error(e: Error) -> ApiError {
    let status = match &e {
        Error::Validation(_) | Error::InvalidUserId(_) => StatusCode::BAD_REQUEST,
        Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
        Error::UserExists(_) => StatusCode::CONFLICT,
        Error::UserNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, message.into())
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, message.into())
}

/// Persist a user's state after an edit.
pub(crate) fn persist(app: &AppState, username: &str, state: &UserState) -> Result<(), ApiError> {
    app.store.save(username, state).map_err(|e| {
        error!(username, error = %e, "Failed to save state");
        core_error(e)
    })
}

/// Save `next` and make it the session's state. A failed save leaves the
/// cached state as it was.
pub(crate) fn commit(
    app: &AppState,
    username: &str,
    session: &mut UserSession,
    next: UserState,
) -> Result<(), ApiError> {
    persist(app, username, &next)?;
    session.state = next;
    Ok(())
}

/// Create the main router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/", get(landing::index))
        .route("/health", get(health::health_check));

    // Protected routes (require auth)
    let protected_routes = Router::new()
        .merge(auth::router())
        .merge(user_state::router())
        .merge(profile::router())
        .merge(chat::router())
        .merge(memory::router())
        .merge(admin::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api", auth::public_router().merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Router harness shared by the route tests.

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use concierge_agent::Concierge;
    use concierge_agent::llm::{MockLlmClient, MockStep};
    use concierge_core::Config;
    use concierge_core::pricing::PricingService;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub struct TestApp {
        pub state: Arc<AppState>,
        pub router: Router,
        _dir: TempDir,
    }

    impl TestApp {
        /// App without a chat model.
        pub fn new() -> Self {
            Self::build(None)
        }

        /// App whose model replays `steps`.
        pub fn with_model(steps: Vec<MockStep>) -> Self {
            Self::build(Some(steps))
        }

        fn build(steps: Option<Vec<MockStep>>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = Config::default();
            config.paths.data_dir = dir.path().to_path_buf();
            config.paths.log_dir = dir.path().join("logs");
            config.ensure_dirs().unwrap();

            let store = Arc::new(config.state_store());
            let concierge = steps.map(|steps| {
                Concierge::new(
                    Arc::new(MockLlmClient::from_steps("mock-model", steps)),
                    store.clone(),
                    Arc::new(PricingService::disabled()),
                )
            });

            let state = AppState::with_concierge(config, store, concierge);
            let router = create_router(state.clone());
            Self {
                state,
                router,
                _dir: dir,
            }
        }

        /// Create an account and return a bearer token for it.
        pub async fn login(&self, username: &str) -> String {
            self.state.users.create_user(username, "secret", None).unwrap();
            self.state.tokens.issue(username, None).await.encode()
        }

        pub async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            (status, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TestApp;
    use super::*;

    #[test]
    fn test_core_error_status() {
        assert_eq!(core_error(Error::validation("bad")).0, StatusCode::BAD_REQUEST);
        assert_eq!(core_error(Error::InvalidCredentials).0, StatusCode::UNAUTHORIZED);
        assert_eq!(core_error(Error::UserExists("a".into())).0, StatusCode::CONFLICT);
        assert_eq!(core_error(Error::Other("x".into())).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let app = TestApp::new();

        let (status, body) = app.send("GET", "/api/state", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "MISSING_TOKEN");

        let (status, body) = app.send("GET", "/api/state", Some("bm90LWEtdG9rZW4="), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_expired_token_is_revoked() {
        let app = TestApp::new();
        let expired = app.state.tokens.issue("alice", Some(std::time::Duration::ZERO)).await;
        app.state.session("alice").await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (status, body) = app.send("GET", "/api/state", Some(&expired.encode()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "EXPIRED_TOKEN");
        assert_eq!(app.state.tokens.len().await, 0);
        assert_eq!(app.state.active_sessions().await, 0);
    }
}
