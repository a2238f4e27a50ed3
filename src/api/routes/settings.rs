//! Credential and data management endpoints.

use axum::{
    extract::State,
    response::Json,
    routing::{delete, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/credential", put(set_credential))
        .route("/all", delete(clear_all))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub key: String,
}

/// PUT /credential - store the generation API key.
async fn set_credential(
    State(state): State<AppState>,
    Json(req): Json<CredentialRequest>,
) -> ApiResult<Json<Value>> {
    if req.key.trim().is_empty() {
        return Err(ApiError::bad_request("API key must not be empty"));
    }

    state.handle.set_credential(req.key).await;
    info!("API key updated via API");
    Ok(Json(json!({ "ok": true })))
}

/// DELETE /all - wipe sessions and summary history.
async fn clear_all(State(state): State<AppState>) -> Json<Value> {
    state.handle.clear_all().await;
    info!("All sessions and history cleared via API");
    Json(json!({ "ok": true }))
}
