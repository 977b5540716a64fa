//! Whole-document access to the signed-in user's state.

use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use concierge_core::types::UserState;
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, persist};
use crate::middleware::AuthContext;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/state", get(get_state))
        .route("/state/save", post(save_state))
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub username: String,
    pub display_name: String,
    pub state: UserState,
}

async fn get_state(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Json<StateResponse> {
    let session = state.session(&auth.username).await;
    let session = session.lock().await;

    Json(StateResponse {
        display_name: state.users.display_name(&auth.username),
        username: auth.username,
        state: session.state.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub saved: bool,
}

/// Write the cached state to disk now.
async fn save_state(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SaveResponse>, ApiError> {
    let session = state.session(&auth.username).await;
    let session = session.lock().await;
    persist(&state, &auth.username, &session.state)?;
    Ok(Json(SaveResponse { saved: true }))
}
