//! Health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: HealthComponents,
    pub metrics: HealthMetrics,
}

#[derive(Serialize)]
pub struct HealthComponents {
    pub chat_model: bool,
    pub pricing: bool,
    pub storage: bool,
}

#[derive(Serialize)]
pub struct HealthMetrics {
    pub active_tokens: usize,
    pub active_sessions: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let chat_model = state.concierge.is_some();
    let pricing = state.config.pricing.credentials().is_some();
    let storage = state.store.dir().is_dir();

    // Pricing is optional; lookups degrade to an "unavailable" result
    let status = if chat_model && storage {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: HealthComponents {
            chat_model,
            pricing,
            storage,
        },
        metrics: HealthMetrics {
            active_tokens: state.tokens.len().await,
            active_sessions: state.active_sessions().await,
        },
    })
}
