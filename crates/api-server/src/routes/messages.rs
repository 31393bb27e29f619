//! Chat API endpoints
//!
//! Messages are answered in the background: submitting returns a result id
//! which the client polls until the snapshot is completed.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use agent_runner::{JobSnapshot, MessageRole, DEFAULT_SESSION_ID};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{error_response, RouteError, StatusResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitMessageRequest {
    content: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitMessageResponse {
    result_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionSelector {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetSystemMessageRequest {
    prompt: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SystemMessageResponse {
    message: String,
}

fn session_id(raw: Option<String>) -> String {
    raw.map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

/// Content arrives percent-encoded; undecodable input is used as sent
fn decode_content(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!("Message content is not valid percent-encoding: {}", e);
            raw.to_string()
        }
    }
}

/// POST /api/messages - Queue a user message
async fn submit_message(
    State(state): State<AppState>,
    Json(req): Json<SubmitMessageRequest>,
) -> Json<SubmitMessageResponse> {
    let content = decode_content(&req.content);
    let result_id = state
        .executor()
        .submit(&session_id(req.session_id), content)
        .await;

    Json(SubmitMessageResponse { result_id })
}

/// GET /api/results/{id} - Poll a job
async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, RouteError> {
    state
        .results()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Result not found"))
}

/// POST /api/messages/clear - Forget the conversation
///
/// The body is optional; without one the default session is cleared.
async fn clear_messages(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, RouteError> {
    let selector: SessionSelector = if body.is_empty() {
        SessionSelector::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
        })?
    };

    let session = state.sessions().session(&session_id(selector.session_id)).await;
    session.clear().await;
    Ok(StatusResponse::ok())
}

/// GET /api/system-message
async fn get_system_message(
    State(state): State<AppState>,
    Query(selector): Query<SessionSelector>,
) -> Json<SystemMessageResponse> {
    let session = state.sessions().session(&session_id(selector.session_id)).await;
    Json(SystemMessageResponse {
        message: session.system_message().await,
    })
}

/// POST /api/system-message - Replace the instruction of one session
async fn set_system_message(
    State(state): State<AppState>,
    Json(req): Json<SetSystemMessageRequest>,
) -> Result<Json<StatusResponse>, RouteError> {
    let role = match req.role.as_deref() {
        Some(raw) => raw
            .parse::<MessageRole>()
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => MessageRole::System,
    };

    let session = state.sessions().session(&session_id(req.session_id)).await;
    debug!("Setting {} instruction for session {}", role.as_str(), session.id);
    session.set_system_message(req.prompt, role).await;
    Ok(StatusResponse::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/messages", post(submit_message))
        .route("/api/messages/clear", post(clear_messages))
        .route("/api/results/{id}", get(get_result))
        .route(
            "/api/system-message",
            get(get_system_message).post(set_system_message),
        )
}
