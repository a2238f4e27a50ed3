//! Summary history endpoints.

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::history::SummaryRecord;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_history))
        .route("/last", get(last_summary))
        .with_state(state)
}

/// GET /history - bounded summary history, oldest first.
async fn list_history(State(state): State<AppState>) -> Json<Vec<SummaryRecord>> {
    Json(state.handle.history().await)
}

/// GET /history/last - most recent summary or null.
async fn last_summary(State(state): State<AppState>) -> Json<Value> {
    match state.handle.last_summary().await {
        Some(record) => Json(json!(record)),
        None => Json(Value::Null),
    }
}
