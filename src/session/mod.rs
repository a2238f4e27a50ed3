//! Per-meeting session log store.
//!
//! Owns every in-memory utterance buffer. Appends dedupe against the last
//! stored utterance, enforce a ring-buffer cap, and schedule a debounced
//! write-through to the durable store. Finalization snapshots a session
//! out of the map; utterances arriving mid-summarization start the next
//! session for that key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::store::{keys, KvStore};

/// One captured caption increment, immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub timestamp: DateTime<Utc>,
    pub speaker: Option<String>,
    pub text: String,
}

impl Utterance {
    pub fn now(speaker: Option<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            speaker,
            text: text.into(),
        }
    }
}

struct Inner {
    sessions: HashMap<String, VecDeque<Utterance>>,
    flush_task: Option<JoinHandle<()>>,
}

/// Handle to the session store, cloneable across tasks.
#[derive(Clone)]
pub struct SessionLog {
    inner: Arc<Mutex<Inner>>,
    kv: Arc<dyn KvStore>,
    log_cap: usize,
    debounce: Duration,
}

impl SessionLog {
    pub fn new(kv: Arc<dyn KvStore>, log_cap: usize, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                sessions: HashMap::new(),
                flush_task: None,
            })),
            kv,
            log_cap,
            debounce,
        }
    }

    /// Restore all sessions from the durable store. Must run before any
    /// append is accepted.
    pub async fn rehydrate(&self) -> anyhow::Result<()> {
        let Some(json) = self.kv.get(keys::SESSIONS).await? else {
            return Ok(());
        };

        let sessions: HashMap<String, VecDeque<Utterance>> = serde_json::from_str(&json)?;
        let count = sessions.len();

        let mut inner = self.inner.lock().await;
        inner.sessions = sessions;
        debug!("Rehydrated {} session(s) from durable store", count);
        Ok(())
    }

    /// Append an utterance. Returns `false` when it duplicated the last
    /// stored text for the key and was suppressed.
    pub async fn append(&self, meeting_key: &str, utterance: Utterance) -> bool {
        let mut inner = self.inner.lock().await;
        let log = inner.sessions.entry(meeting_key.to_string()).or_default();

        if log.back().map(|u| u.text.as_str()) == Some(utterance.text.as_str()) {
            return false;
        }

        log.push_back(utterance);
        while log.len() > self.log_cap {
            log.pop_front();
        }

        self.schedule_flush(&mut inner);
        true
    }

    pub async fn len(&self, meeting_key: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.sessions.get(meeting_key).map_or(0, |l| l.len())
    }

    /// Snapshot-and-remove the session for finalization. `None` when the
    /// key has no session (a duplicate end signal lands here).
    pub async fn take(&self, meeting_key: &str) -> Option<Vec<Utterance>> {
        let mut inner = self.inner.lock().await;
        let log = inner.sessions.remove(meeting_key)?;
        self.schedule_flush(&mut inner);
        Some(log.into())
    }

    /// Put a finalize snapshot back, ahead of anything that arrived while
    /// summarization was running. Keeps failed sessions retryable.
    pub async fn restore(&self, meeting_key: &str, snapshot: Vec<Utterance>) {
        let mut inner = self.inner.lock().await;
        let mid_flight = inner.sessions.remove(meeting_key).unwrap_or_default();

        let mut log: VecDeque<Utterance> = snapshot.into();
        log.extend(mid_flight);
        while log.len() > self.log_cap {
            log.pop_front();
        }

        inner.sessions.insert(meeting_key.to_string(), log);
        self.schedule_flush(&mut inner);
    }

    /// Drop every session, in memory and durable.
    pub async fn clear_all(&self) {
        let mut inner = self.inner.lock().await;
        inner.sessions.clear();
        if let Some(task) = inner.flush_task.take() {
            task.abort();
        }
        drop(inner);

        if let Err(e) = self.kv.remove(keys::SESSIONS).await {
            warn!("Failed to clear persisted sessions: {e:#}");
        }
    }

    /// Cancel-and-reschedule the debounced durable write. A failed write is
    /// retried on the next tick and never blocks the in-memory append.
    fn schedule_flush(&self, inner: &mut Inner) {
        if let Some(task) = inner.flush_task.take() {
            task.abort();
        }

        let this = self.clone();
        inner.flush_task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(this.debounce).await;
                if this.try_flush().await {
                    break;
                }
            }
        }));
    }

    /// Write the current state through to the durable store immediately.
    pub async fn flush_now(&self) -> bool {
        self.try_flush().await
    }

    async fn try_flush(&self) -> bool {
        let json = {
            let inner = self.inner.lock().await;
            match serde_json::to_string(&inner.sessions) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize session logs: {e:#}");
                    return true; // not retryable
                }
            }
        };

        match self.kv.set(keys::SESSIONS, &json).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist session logs, will retry: {e:#}");
                false
            }
        }
    }
}
