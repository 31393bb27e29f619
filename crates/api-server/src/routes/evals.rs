//! Evaluation API endpoints

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pl_core::registry::EvalSummary;
use serde::{Deserialize, Serialize};

use super::{error_response, RouteError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RunEvalRequest {
    version: String,
}

#[derive(Debug, Serialize)]
struct ScoresResponse {
    scores: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
struct RunEvalResponse {
    status: &'static str,
    version: String,
    score: f64,
    summary: EvalSummary,
}

/// GET /api/evals/scores
async fn get_scores(State(state): State<AppState>) -> Json<ScoresResponse> {
    Json(ScoresResponse {
        scores: state.registry().scores().await,
    })
}

/// POST /api/evals/run - Score a version, replacing any earlier score
async fn run_eval(
    State(state): State<AppState>,
    Json(req): Json<RunEvalRequest>,
) -> Result<Json<RunEvalResponse>, RouteError> {
    let version = req.version.trim();
    if version.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Version is required"));
    }

    let report = state.registry().record_eval_score(version).await;
    Ok(Json(RunEvalResponse {
        status: "ok",
        version: report.version,
        score: report.score,
        summary: report.summary,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/evals/scores", get(get_scores))
        .route("/api/evals/run", post(run_eval))
}
