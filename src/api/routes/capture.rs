//! Capture-side endpoints: utterance logging, end signals, manual
//! summarization, and pipeline status.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::lifecycle::EndReason;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/log", post(log_utterance))
        .route("/end", post(end_meeting))
        .route("/summarize", post(summarize_now))
        .route("/status", get(pipeline_status))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LogRequest {
    pub meeting_key: String,
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndRequest {
    pub meeting_key: String,
    #[serde(default)]
    pub reason: Option<EndReason>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub meeting_key: String,
}

/// POST /log - fire-and-forget utterance append.
async fn log_utterance(State(state): State<AppState>, Json(req): Json<LogRequest>) -> Json<Value> {
    state
        .handle
        .log(&req.meeting_key, &req.text, req.speaker)
        .await;
    Json(json!({ "ok": true }))
}

/// POST /end - lifecycle end signal; responds with the finalize outcome.
/// Failures map to `{ok:false, error: <stable code>}` via `ApiError`.
async fn end_meeting(
    State(state): State<AppState>,
    Json(req): Json<EndRequest>,
) -> ApiResult<Json<Value>> {
    let reason = req.reason.unwrap_or(EndReason::IndicatorLost);
    info!(
        "End signal for {} (reason: {})",
        req.meeting_key,
        reason.as_str()
    );

    let record = state.handle.finalize(&req.meeting_key, reason).await?;
    Ok(Json(json!({ "ok": true, "summary": record })))
}

/// POST /summarize - manual trigger, same response shape as /end.
async fn summarize_now(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> ApiResult<Json<Value>> {
    let record = state
        .handle
        .finalize(&req.meeting_key, EndReason::Manual)
        .await?;
    Ok(Json(json!({ "ok": true, "summary": record })))
}

/// GET /status - current summarization phase.
async fn pipeline_status(State(state): State<AppState>) -> Json<Value> {
    let status = state.status.get().await;
    Json(json!({
        "phase": status.phase.as_str(),
        "meeting_key": status.meeting_key,
        "last_error": status.last_error,
    }))
}
