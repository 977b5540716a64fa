//! Profile editing routes.
//!
//! Program positions in paths are 0-based list indices.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post, put},
};
use concierge_core::types::{LoyaltyProgram, Profile, ProgramKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, bad_request, commit, not_found};
use crate::middleware::AuthContext;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", put(update_profile))
        .route("/profile/programs/{kind}", post(add_program))
        .route("/profile/programs/{kind}/{index}", delete(remove_program))
        .route("/profile/programs/{kind}/{index}/toggle", post(toggle_program))
}

fn parse_kind(kind: &str) -> Result<ProgramKind, ApiError> {
    kind.parse().map_err(bad_request)
}

/// Body for `PUT /profile`: a whole profile, or a list of field edits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProfileUpdate {
    Fields { fields: Vec<FieldEdit> },
    Replace(Box<Profile>),
}

#[derive(Debug, Deserialize)]
pub struct FieldEdit {
    pub field: String,
    pub value: String,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;

    // Edits land on a copy; a bad edit or failed save changes nothing
    let mut next = session.state.clone();
    match update {
        ProfileUpdate::Fields { fields } => {
            for edit in &fields {
                next.profile
                    .set_field(&edit.field, &edit.value)
                    .map_err(|e| bad_request(e.to_string()))?;
            }
        }
        ProfileUpdate::Replace(profile) => next.profile = *profile,
    }

    commit(&state, &auth.username, &mut session, next)?;
    info!(username = %auth.username, "Profile updated");
    Ok(Json(session.state.profile.clone()))
}

#[derive(Debug, Deserialize)]
pub struct NewProgram {
    pub program: String,
    pub member_id: String,
    #[serde(default)]
    pub status: String,
}

async fn add_program(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(kind): Path<String>,
    Json(input): Json<NewProgram>,
) -> Result<(StatusCode, Json<Vec<LoyaltyProgram>>), ApiError> {
    let kind = parse_kind(&kind)?;
    if input.program.trim().is_empty() {
        return Err(bad_request("Program name must not be empty"));
    }

    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;
    let mut next = session.state.clone();
    next.profile
        .programs_mut(kind)
        .push(LoyaltyProgram::new(input.program.trim(), input.member_id, input.status));
    commit(&state, &auth.username, &mut session, next)?;

    Ok((
        StatusCode::CREATED,
        Json(session.state.profile.programs(kind).to_vec()),
    ))
}

async fn remove_program(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((kind, index)): Path<(String, usize)>,
) -> Result<Json<LoyaltyProgram>, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;

    let mut next = session.state.clone();
    let removed = next
        .profile
        .remove_program(kind, index)
        .ok_or_else(|| not_found(format!("No {} program at index {}", kind.as_str(), index)))?;
    commit(&state, &auth.username, &mut session, next)?;
    Ok(Json(removed))
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub active: bool,
}

async fn toggle_program(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((kind, index)): Path<(String, usize)>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let session = state.session(&auth.username).await;
    let mut session = session.lock().await;

    let mut next = session.state.clone();
    let active = next
        .profile
        .toggle_program(kind, index)
        .ok_or_else(|| not_found(format!("No {} program at index {}", kind.as_str(), index)))?;
    commit(&state, &auth.username, &mut session, next)?;
    Ok(Json(ToggleResponse { active }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use concierge_core::storage::StateStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_field_edits_persist() {
        let app = TestApp::new();
        let token = app.login("alice").await;

        let (status, body) = app
            .send(
                "PUT",
                "/api/profile",
                Some(&token),
                Some(json!({"fields": [
                    {"field": "name", "value": "Alice Liddell"},
                    {"field": "flight.home_airport", "value": "sfo"}
                ]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Alice Liddell");
        assert_eq!(body["flight_preferences"]["home_airport"], "SFO");

        let saved = app.state.store.read("alice").unwrap().unwrap();
        assert_eq!(saved.profile.name, "Alice Liddell");
    }

    #[tokio::test]
    async fn test_bad_field_edit_changes_nothing() {
        let app = TestApp::new();
        let token = app.login("alice").await;

        let (status, _) = app
            .send(
                "PUT",
                "/api/profile",
                Some(&token),
                Some(json!({"fields": [
                    {"field": "name", "value": "Alice"},
                    {"field": "shoe_size", "value": "9"}
                ]})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = app.send("GET", "/api/state", Some(&token), None).await;
        assert_eq!(body["state"]["profile"]["name"], "");
    }

    #[tokio::test]
    async fn test_replace_profile() {
        let app = TestApp::new();
        let token = app.login("alice").await;

        let (status, body) = app
            .send(
                "PUT",
                "/api/profile",
                Some(&token),
                Some(json!({"name": "Alice", "home_city": "Paris", "currency": "EUR"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["home_city"], "Paris");
    }

    #[tokio::test]
    async fn test_program_add_toggle_remove() {
        let app = TestApp::new();
        let token = app.login("alice").await;

        let (status, body) = app
            .send(
                "POST",
                "/api/profile/programs/flyer",
                Some(&token),
                Some(json!({"program": "United MileagePlus", "member_id": "UA123", "status": "Gold"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body[0]["program"], "United MileagePlus");
        assert_eq!(body[0]["active"], false);

        let (status, body) = app
            .send("POST", "/api/profile/programs/flyer/0/toggle", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], true);

        let (status, _) = app
            .send("DELETE", "/api/profile/programs/flyer/3", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .send("DELETE", "/api/profile/programs/flyer/0", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["member_id"], "UA123");

        let (status, _) = app
            .send("POST", "/api/profile/programs/bogus", Some(&token), Some(json!({"program": "X", "member_id": "1"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_profile_untouched() {
        let app = TestApp::new();
        let token = app.login("alice").await;
        std::fs::create_dir_all(app.state.store.user_path("alice").unwrap()).unwrap();

        let (status, _) = app
            .send(
                "PUT",
                "/api/profile",
                Some(&token),
                Some(json!({"fields": [{"field": "name", "value": "Alice"}]})),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (_, body) = app.send("GET", "/api/state", Some(&token), None).await;
        assert_eq!(body["state"]["profile"]["name"], "");
    }
}
