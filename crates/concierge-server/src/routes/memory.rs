//! Memory note routes.
//!
//! - GET/POST /memory - List notes and add one
//! - DELETE /memory/{scope}/{index} - Remove a note (0-based index)
//! - POST /memory/consolidate - Move session notes into global memory

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use concierge_core::memory::{self, ConsolidationReport};
use concierge_core::types::{MemoryNote, MemoryScope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, bad_request, commit, core_error, not_found};
use crate::middleware::AuthContext;
use crate::state::AppState;

/// Create memory router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/memory", get(list_notes).post(add_note))
        .route("/memory/{scope}/{index}", delete(remove_note))
        .route("/memory/consolidate", post(consolidate))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    pub session: Vec<MemoryNote>,
    pub global: Vec<MemoryNote>,
}

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub text: String,
    #[serde(default)]
    pub scope: MemoryScope,
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Json<MemoryResponse> {
    let session = state.session(&auth.username).await;
    let session = session.lock().await;

    Json(MemoryResponse {
        session: session.state.session_memory.notes.clone(),
        global: session.state.global_memory.notes.clone(),
    })
}

async fn add_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<MemoryNote>), ApiError> {
    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;

    let mut next = session.state.clone();
    let note = memory::add_note(&mut next, input.scope, &input.text, &input.keywords)
        .map_err(core_error)?;
    commit(&state, &auth.username, &mut session, next)?;

    info!(username = %auth.username, scope = %input.scope, "Memory note added");
    Ok((StatusCode::CREATED, Json(note)))
}

async fn remove_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((scope, index)): Path<(String, usize)>,
) -> Result<Json<MemoryNote>, ApiError> {
    let scope: MemoryScope = scope.parse().map_err(bad_request)?;

    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;

    let mut next = session.state.clone();
    let removed = memory::remove_note(&mut next, scope, index)
        .ok_or_else(|| not_found(format!("No {} note at index {}", scope, index)))?;
    commit(&state, &auth.username, &mut session, next)?;

    info!(username = %auth.username, %scope, "Memory note removed");
    Ok(Json(removed))
}

async fn consolidate(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ConsolidationReport>, ApiError> {
    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;

    // Session notes stay cached until the promoted state is on disk
    let mut next = session.state.clone();
    let report = memory::consolidate(&mut next);
    if !report.is_noop() {
        commit(&state, &auth.username, &mut session, next)?;
        info!(
            username = %auth.username,
            promoted = report.promoted,
            global_total = report.global_total,
            "Consolidated memory"
        );
    }
    Ok(Json(report))
}
