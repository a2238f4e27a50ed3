//! Service wiring: construct the stores, orchestrator, and API surface,
//! rehydrate durable state, then run until interrupted.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::ApiServer;
use crate::artifacts::LocalArtifactSink;
use crate::config::Config;
use crate::genai::GeminiBackend;
use crate::global;
use crate::history::HistoryLog;
use crate::service::Service;
use crate::session::SessionLog;
use crate::store::{KvStore, SqliteKvStore};
use crate::summarize::{SummarizeStatusHandle, Summarizer};

pub async fn run_service() -> Result<()> {
    info!("Starting meetnote service");

    let config = Config::load()?;
    let kv: Arc<dyn KvStore> = Arc::new(SqliteKvStore::open_default()?);

    let sessions = SessionLog::new(
        kv.clone(),
        config.session.log_cap,
        Duration::from_millis(config.session.flush_debounce_ms),
    );
    sessions.rehydrate().await?;

    let sink = Arc::new(LocalArtifactSink::new(global::artifacts_dir()?));
    let history = HistoryLog::new(kv.clone(), sink, config.summary.history_cap);
    history.rehydrate().await?;

    let backend = Arc::new(GeminiBackend::new(&config.genai)?);
    let status = SummarizeStatusHandle::default();
    let summarizer = Summarizer::new(
        sessions.clone(),
        history.clone(),
        backend,
        kv.clone(),
        status.clone(),
        config.genai.clone(),
        config.summary.clone(),
    );

    let (handle, service_task) = Service::new(sessions, history, summarizer, kv).spawn();

    info!("meetnote is ready");
    let api_server = ApiServer::new(config.server.port, handle, status);
    api_server.start().await?;

    service_task.abort();
    Ok(())
}
