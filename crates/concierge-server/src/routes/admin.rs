//! Log views and server status.

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use concierge_core::logs::LogStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, core_error};
use crate::middleware::AuthContext;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/logs", get(logs).delete(clear_logs))
        .route("/admin/errors", get(errors))
        .route("/admin/status", get(status))
}

#[derive(Debug, Deserialize)]
pub struct LinesQuery {
    pub lines: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LogLines {
    pub lines: Vec<String>,
}

async fn logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LinesQuery>,
) -> Result<Json<LogLines>, ApiError> {
    let lines = state
        .log_file
        .tail(query.lines.unwrap_or(100))
        .map_err(core_error)?;
    Ok(Json(LogLines { lines }))
}

async fn errors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LinesQuery>,
) -> Result<Json<LogLines>, ApiError> {
    let lines = state
        .log_file
        .errors(query.lines.unwrap_or(50))
        .map_err(core_error)?;
    Ok(Json(LogLines { lines }))
}

async fn clear_logs(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, ApiError> {
    state.log_file.clear().map_err(core_error)?;
    info!(username = %auth.username, "Logs cleared");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ServerStatus {
    pub version: String,
    pub uptime_seconds: u64,
    pub model: Option<String>,
    pub pricing_configured: bool,
    pub accounts: usize,
    pub active_sessions: usize,
    pub logs: LogStats,
}

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<ServerStatus>, ApiError> {
    Ok(Json(ServerStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state
            .concierge
            .as_ref()
            .map(|c| c.model().model().to_string()),
        pricing_configured: state.config.pricing.credentials().is_some(),
        accounts: state.users.list_users().map_err(core_error)?.len(),
        active_sessions: state.active_sessions().await,
        logs: state.log_file.stats().map_err(core_error)?,
    }))
}
