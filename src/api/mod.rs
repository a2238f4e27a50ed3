//! Local HTTP surface for the meetnote service.
//!
//! Thin translation between the message contract and the service channel:
//! - Capture side: utterance logging, end signals, manual summarize
//! - Summary history retrieval
//! - Credential and data management

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

use crate::service::ServiceHandle;
use crate::summarize::SummarizeStatusHandle;

#[derive(Clone)]
pub struct AppState {
    pub handle: ServiceHandle,
    pub status: SummarizeStatusHandle,
}

pub struct ApiServer {
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(port: u16, handle: ServiceHandle, status: SummarizeStatusHandle) -> Self {
        Self {
            port,
            state: AppState { handle, status },
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(service_info))
            .merge(routes::capture::router(self.state.clone()))
            .nest("/history", routes::history::router(self.state.clone()))
            .merge(routes::settings::router(self.state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  POST   /log           - Append a captured utterance");
        info!("  POST   /end           - Signal meeting end, returns summary outcome");
        info!("  POST   /summarize     - Manual summarize trigger");
        info!("  GET    /status        - Summarization pipeline status");
        info!("  GET    /history       - List summary history");
        info!("  GET    /history/last  - Most recent summary");
        info!("  PUT    /credential    - Store the generation API key");
        info!("  DELETE /all           - Wipe sessions and history");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "meetnote",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
