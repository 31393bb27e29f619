//! Prompt version API endpoints
//!
//! Creating and editing prompt documents, pointing environments at versions
//! and promoting to production.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use pl_core::prompt::{InitialPrompt, PromptDocument, PromptRepository, INITIAL_PROMPTS};
use pl_core::registry::ActiveVersions;
use serde::{Deserialize, Serialize};

use super::{core_error, error_response, RouteError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreatePromptRequest {
    name: String,
    prompt: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatePromptRequest {
    name: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct SetActiveRequest {
    environment: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishRequest {
    version: String,
}

#[derive(Debug, Serialize)]
struct PromptListResponse {
    prompts: Vec<PromptDocument>,
}

#[derive(Debug, Serialize)]
struct PromptResponse {
    status: &'static str,
    prompt: PromptDocument,
}

#[derive(Debug, Serialize)]
struct SetActiveResponse {
    status: &'static str,
    environment: &'static str,
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct PublishResponse {
    status: &'static str,
    version: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/initial-prompts - Starter prompts
async fn initial_prompts() -> Json<Vec<InitialPrompt>> {
    Json(INITIAL_PROMPTS.to_vec())
}

/// GET /api/prompts - Stored documents followed by unshadowed seeds
async fn list_prompts(State(state): State<AppState>) -> Result<Json<PromptListResponse>, RouteError> {
    let prompts = state.prompts().list().await.map_err(core_error)?;
    Ok(Json(PromptListResponse { prompts }))
}

/// POST /api/prompts - Create a document
async fn create_prompt(
    State(state): State<AppState>,
    Json(req): Json<CreatePromptRequest>,
) -> Result<Json<PromptResponse>, RouteError> {
    let prompt = state
        .prompts()
        .create(&req.name, &req.prompt, req.version.as_deref())
        .await
        .map_err(core_error)?;

    Ok(Json(PromptResponse {
        status: "ok",
        prompt,
    }))
}

/// PUT /api/prompts/{version} - Replace name and text of a stored document
async fn update_prompt(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Json(req): Json<UpdatePromptRequest>,
) -> Result<Json<PromptResponse>, RouteError> {
    let prompt = state
        .prompts()
        .update(&version, &req.name, &req.prompt)
        .await
        .map_err(core_error)?;

    Ok(Json(PromptResponse {
        status: "ok",
        prompt,
    }))
}

/// GET /api/prompts/active
async fn get_active(State(state): State<AppState>) -> Json<ActiveVersions> {
    Json(state.registry().active().await)
}

/// POST /api/prompts/active - Point an environment at a version
async fn set_active(
    State(state): State<AppState>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<SetActiveResponse>, RouteError> {
    let (environment, version) = state
        .registry()
        .set_active(&req.environment, req.version)
        .await
        .map_err(core_error)?;

    Ok(Json(SetActiveResponse {
        status: "ok",
        environment: environment.as_str(),
        version,
    }))
}

/// POST /api/prompts/publish - Promote to production behind the score gate
async fn publish(
    State(state): State<AppState>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, RouteError> {
    let version = req.version.trim().to_string();
    if version.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Version is required"));
    }

    state.registry().promote(&version).await.map_err(core_error)?;

    Ok(Json(PublishResponse {
        status: "ok",
        version,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/initial-prompts", get(initial_prompts))
        .route("/api/prompts", get(list_prompts).post(create_prompt))
        .route("/api/prompts/active", get(get_active).post(set_active))
        .route("/api/prompts/publish", post(publish))
        .route("/api/prompts/{version}", put(update_prompt))
}
