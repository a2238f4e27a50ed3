//! Summary history and artifact bookkeeping.
//!
//! Completed summaries are appended to a bounded, durable history. Artifact
//! persistence is best-effort: the generated text is the expensive artifact,
//! so a sink failure degrades to a warning on the record instead of rolling
//! the summary back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::artifacts::{ArtifactFile, ArtifactRef, ArtifactSink};
use crate::lifecycle::EndReason;
use crate::store::{keys, KvStore};

pub const SUMMARY_FILE: &str = "summary.md";
pub const TRANSCRIPT_FILE: &str = "transcript.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRefs {
    pub summary: ArtifactRef,
    pub transcript: ArtifactRef,
}

/// One completed summarization, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: String,
    pub meeting_key: String,
    pub created_at: DateTime<Utc>,
    pub model_used: String,
    pub end_reason: EndReason,
    pub utterance_count: usize,
    pub summary_text: String,
    pub artifacts: Option<ArtifactRefs>,
    pub artifact_warning: Option<String>,
}

impl SummaryRecord {
    pub fn new(
        meeting_key: impl Into<String>,
        model_used: impl Into<String>,
        end_reason: EndReason,
        utterance_count: usize,
        summary_text: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            meeting_key: meeting_key.into(),
            created_at: Utc::now(),
            model_used: model_used.into(),
            end_reason,
            utterance_count,
            summary_text: summary_text.into(),
            artifacts: None,
            artifact_warning: None,
        }
    }
}

/// Bounded, durable summary history.
#[derive(Clone)]
pub struct HistoryLog {
    inner: Arc<Mutex<Vec<SummaryRecord>>>,
    kv: Arc<dyn KvStore>,
    sink: Arc<dyn ArtifactSink>,
    cap: usize,
}

impl HistoryLog {
    pub fn new(kv: Arc<dyn KvStore>, sink: Arc<dyn ArtifactSink>, cap: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
            kv,
            sink,
            cap,
        }
    }

    pub async fn rehydrate(&self) -> anyhow::Result<()> {
        let Some(json) = self.kv.get(keys::HISTORY).await? else {
            return Ok(());
        };

        let records: Vec<SummaryRecord> = serde_json::from_str(&json)?;
        *self.inner.lock().await = records;
        Ok(())
    }

    /// Persist the summary and transcript artifacts, then append the record
    /// to the history. Artifact failure never discards the record.
    pub async fn commit(&self, mut record: SummaryRecord, transcript_text: &str) -> SummaryRecord {
        let folder_hint = format!(
            "{}-{}",
            record.meeting_key,
            record.created_at.format("%Y%m%d-%H%M%S")
        );

        let files = [
            ArtifactFile {
                name: SUMMARY_FILE,
                text: &record.summary_text,
            },
            ArtifactFile {
                name: TRANSCRIPT_FILE,
                text: transcript_text,
            },
        ];

        match self.sink.write(&folder_hint, &files).await {
            Ok(refs) if refs.len() == 2 => {
                record.artifacts = Some(ArtifactRefs {
                    summary: refs[0].clone(),
                    transcript: refs[1].clone(),
                });
            }
            Ok(refs) => {
                warn!("Artifact sink returned {} ref(s), expected 2", refs.len());
                record.artifact_warning = Some("incomplete artifact bundle".to_string());
            }
            Err(e) => {
                warn!("Artifact persistence failed, keeping summary: {e:#}");
                record.artifact_warning = Some(e.to_string());
            }
        }

        let mut records = self.inner.lock().await;
        records.push(record.clone());
        while records.len() > self.cap {
            records.remove(0);
        }

        self.persist(&records).await;
        info!(
            "Summary {} for meeting {} committed ({} in history)",
            record.id,
            record.meeting_key,
            records.len()
        );
        record
    }

    pub async fn last(&self) -> Option<SummaryRecord> {
        self.inner.lock().await.last().cloned()
    }

    pub async fn list(&self) -> Vec<SummaryRecord> {
        self.inner.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
        if let Err(e) = self.kv.remove(keys::HISTORY).await {
            warn!("Failed to clear persisted history: {e:#}");
        }
    }

    async fn persist(&self, records: &[SummaryRecord]) {
        match serde_json::to_string(records) {
            Ok(json) => {
                if let Err(e) = self.kv.set(keys::HISTORY, &json).await {
                    warn!("Failed to persist summary history: {e:#}");
                }
            }
            Err(e) => warn!("Failed to serialize summary history: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;
    use async_trait::async_trait;

    struct FailingSink;

    #[async_trait]
    impl ArtifactSink for FailingSink {
        async fn write(
            &self,
            _folder_hint: &str,
            _files: &[ArtifactFile<'_>],
        ) -> anyhow::Result<Vec<ArtifactRef>> {
            anyhow::bail!("disk full")
        }
    }

    fn record(key: &str) -> SummaryRecord {
        SummaryRecord::new(key, "v1/models/gemini-1.5-flash", EndReason::Manual, 2, "# Summary")
    }

    #[tokio::test]
    async fn test_commit_attaches_artifact_refs() {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(MemoryKvStore::new());
        let sink = Arc::new(crate::artifacts::LocalArtifactSink::new(
            dir.path().to_path_buf(),
        ));
        let history = HistoryLog::new(kv, sink, 10);

        let committed = history.commit(record("abc-defg-hij"), "full transcript").await;

        let artifacts = committed.artifacts.unwrap();
        assert!(artifacts.summary.resolved_path.ends_with(SUMMARY_FILE));
        assert!(artifacts.transcript.resolved_path.ends_with(TRANSCRIPT_FILE));
        assert!(committed.artifact_warning.is_none());
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_record_with_warning() {
        let kv = Arc::new(MemoryKvStore::new());
        let history = HistoryLog::new(kv, Arc::new(FailingSink), 10);

        let committed = history.commit(record("abc"), "transcript").await;

        assert!(committed.artifacts.is_none());
        assert!(committed.artifact_warning.unwrap().contains("disk full"));
        assert_eq!(history.list().await.len(), 1);
        assert_eq!(history.last().await.unwrap().meeting_key, "abc");
    }

    #[tokio::test]
    async fn test_history_cap_evicts_oldest() {
        let kv = Arc::new(MemoryKvStore::new());
        let history = HistoryLog::new(kv, Arc::new(FailingSink), 3);

        for i in 0..5 {
            history.commit(record(&format!("meeting-{i}")), "t").await;
        }

        let records = history.list().await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].meeting_key, "meeting-2");
        assert_eq!(records[2].meeting_key, "meeting-4");
    }

    #[tokio::test]
    async fn test_history_survives_rehydrate() {
        let kv = Arc::new(MemoryKvStore::new());
        {
            let history = HistoryLog::new(kv.clone(), Arc::new(FailingSink), 10);
            history.commit(record("abc"), "t").await;
        }

        let history = HistoryLog::new(kv, Arc::new(FailingSink), 10);
        history.rehydrate().await.unwrap();
        assert_eq!(history.last().await.unwrap().meeting_key, "abc");
    }

    #[tokio::test]
    async fn test_clear_wipes_memory_and_durable() {
        let kv = Arc::new(MemoryKvStore::new());
        let history = HistoryLog::new(kv.clone(), Arc::new(FailingSink), 10);
        history.commit(record("abc"), "t").await;

        history.clear().await;
        assert!(history.last().await.is_none());
        assert!(kv.get(keys::HISTORY).await.unwrap().is_none());
    }
}
