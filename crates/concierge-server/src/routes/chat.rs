//! Chat turn routes.

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use concierge_agent::llm::Role;
use concierge_agent::{AgentError, TurnOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(send_message).get(transcript).delete(clear_chat))
}

fn agent_error(e: AgentError) -> ApiError {
    let status = match &e {
        AgentError::Core(concierge_core::Error::Validation(_)) => StatusCode::BAD_REQUEST,
        AgentError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
        AgentError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: Uuid,
    #[serde(flatten)]
    pub outcome: TurnOutcome,
}

/// Run one turn. Turns for the same user queue behind the session lock.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let concierge = state.concierge.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "Chat is unavailable: OPENAI_API_KEY is not configured".to_string(),
    ))?;

    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;
    let session = &mut *session;

    let outcome = concierge
        .run_turn(
            &auth.username,
            &mut session.state,
            &mut session.conversation,
            &input.message,
        )
        .await
        .map_err(|e| {
            error!(username = %auth.username, error = %e, "Chat turn failed");
            agent_error(e)
        })?;

    info!(
        username = %auth.username,
        tools = outcome.tools_used.len(),
        reply_chars = outcome.reply.len(),
        "Chat turn completed"
    );

    Ok(Json(ChatResponse {
        conversation_id: session.conversation.id(),
        outcome,
    }))
}

#[derive(Debug, Serialize)]
pub struct TranscriptEntry {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Transcript {
    pub conversation_id: Uuid,
    pub messages: Vec<TranscriptEntry>,
}

/// User and assistant text of the running conversation, tool traffic omitted.
async fn transcript(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Json<Transcript> {
    let session = state.session(&auth.username).await;
    let session = session.lock().await;

    let messages = session
        .conversation
        .messages()
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant) && !m.content.is_empty())
        .map(|m| TranscriptEntry {
            role: m.role.as_str(),
            content: m.content.clone(),
        })
        .collect();

    Json(Transcript {
        conversation_id: session.conversation.id(),
        messages,
    })
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub conversation_id: Uuid,
}

/// Start a new conversation. Memory and profile are kept.
async fn clear_chat(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Json<ClearResponse> {
    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;
    session.conversation.clear();
    info!(username = %auth.username, "Chat cleared");

    Json(ClearResponse {
        conversation_id: session.conversation.id(),
    })
}
