//! Background service: the single consumer of all capture and UI messages.
//!
//! Every cross-component interaction arrives as a typed command over one
//! mpsc channel and is handled in delivery order, so appends for a meeting
//! key are never reordered and finalization is serialized against them.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::SummarizeError;
use crate::history::{HistoryLog, SummaryRecord};
use crate::lifecycle::EndReason;
use crate::session::{SessionLog, Utterance};
use crate::store::{keys, KvStore};
use crate::summarize::Summarizer;

const COMMAND_BUFFER: usize = 64;

pub enum ServiceCommand {
    /// Fire-and-forget utterance append.
    Log {
        meeting_key: String,
        text: String,
        speaker: Option<String>,
    },
    /// Lifecycle end signal or manual trigger; always answered.
    Finalize {
        meeting_key: String,
        reason: EndReason,
        respond: oneshot::Sender<Result<SummaryRecord, SummarizeError>>,
    },
    LastSummary {
        respond: oneshot::Sender<Option<SummaryRecord>>,
    },
    History {
        respond: oneshot::Sender<Vec<SummaryRecord>>,
    },
    SetCredential {
        credential: String,
        respond: oneshot::Sender<()>,
    },
    ClearAll {
        respond: oneshot::Sender<()>,
    },
}

/// Cloneable client side of the service channel.
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<ServiceCommand>,
}

impl ServiceHandle {
    pub async fn log(&self, meeting_key: &str, text: &str, speaker: Option<String>) {
        let command = ServiceCommand::Log {
            meeting_key: meeting_key.to_string(),
            text: text.to_string(),
            speaker,
        };
        if self.tx.send(command).await.is_err() {
            warn!("Service loop gone, dropping log message");
        }
    }

    pub async fn finalize(
        &self,
        meeting_key: &str,
        reason: EndReason,
    ) -> Result<SummaryRecord, SummarizeError> {
        let (respond, response) = oneshot::channel();
        let command = ServiceCommand::Finalize {
            meeting_key: meeting_key.to_string(),
            reason,
            respond,
        };

        if self.tx.send(command).await.is_err() {
            return Err(SummarizeError::Transport("service unavailable".into()));
        }
        response
            .await
            .unwrap_or_else(|_| Err(SummarizeError::Transport("service unavailable".into())))
    }

    pub async fn last_summary(&self) -> Option<SummaryRecord> {
        let (respond, response) = oneshot::channel();
        if self
            .tx
            .send(ServiceCommand::LastSummary { respond })
            .await
            .is_err()
        {
            return None;
        }
        response.await.unwrap_or(None)
    }

    pub async fn history(&self) -> Vec<SummaryRecord> {
        let (respond, response) = oneshot::channel();
        if self
            .tx
            .send(ServiceCommand::History { respond })
            .await
            .is_err()
        {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }

    pub async fn set_credential(&self, credential: String) {
        let (respond, response) = oneshot::channel();
        let command = ServiceCommand::SetCredential {
            credential,
            respond,
        };
        if self.tx.send(command).await.is_ok() {
            let _ = response.await;
        }
    }

    pub async fn clear_all(&self) {
        let (respond, response) = oneshot::channel();
        if self
            .tx
            .send(ServiceCommand::ClearAll { respond })
            .await
            .is_ok()
        {
            let _ = response.await;
        }
    }
}

pub struct Service {
    sessions: SessionLog,
    history: HistoryLog,
    summarizer: Summarizer,
    kv: Arc<dyn KvStore>,
}

impl Service {
    pub fn new(
        sessions: SessionLog,
        history: HistoryLog,
        summarizer: Summarizer,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            sessions,
            history,
            summarizer,
            kv,
        }
    }

    /// Spawn the dispatch loop and return its client handle.
    pub fn spawn(self) -> (ServiceHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                self.handle(command).await;
            }
            debug!("Service loop stopped");
        });
        (ServiceHandle { tx }, task)
    }

    async fn handle(&self, command: ServiceCommand) {
        match command {
            ServiceCommand::Log {
                meeting_key,
                text,
                speaker,
            } => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                let appended = self
                    .sessions
                    .append(&meeting_key, Utterance::now(speaker, text))
                    .await;
                if appended {
                    debug!("Logged utterance for {}", meeting_key);
                }
            }
            ServiceCommand::Finalize {
                meeting_key,
                reason,
                respond,
            } => {
                let result = self.summarizer.finalize(&meeting_key, reason).await;
                if let Err(e) = &result {
                    warn!("Finalize for {} failed: {}", meeting_key, e);
                }
                let _ = respond.send(result);
            }
            ServiceCommand::LastSummary { respond } => {
                let _ = respond.send(self.history.last().await);
            }
            ServiceCommand::History { respond } => {
                let _ = respond.send(self.history.list().await);
            }
            ServiceCommand::SetCredential {
                credential,
                respond,
            } => {
                // The credential value itself is never logged.
                if let Err(e) = self.kv.set(keys::CREDENTIAL, credential.trim()).await {
                    error!("Failed to store API key: {e:#}");
                } else {
                    debug!("API key updated");
                }
                let _ = respond.send(());
            }
            ServiceCommand::ClearAll { respond } => {
                self.sessions.clear_all().await;
                self.history.clear().await;
                debug!("Cleared all sessions and history");
                let _ = respond.send(());
            }
        }
    }
}
