//! Summarization orchestrator.
//!
//! Runs the end-of-session pipeline: credential check, session snapshot,
//! preprocessing, model discovery and selection, generation, and history
//! commit. Triggered only by a lifecycle end signal or a manual request,
//! never by log growth. Every failure path restores the session snapshot so
//! a later retry sees the log intact.

mod preprocess;
mod prompt;
mod status;

pub use preprocess::preprocess;
pub use prompt::{build_prompt, format_transcript};
pub use status::{SummarizePhase, SummarizeStatus, SummarizeStatusHandle};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{GenAiConfig, SummaryConfig};
use crate::error::SummarizeError;
use crate::genai::{pick_model, GenerativeBackend};
use crate::history::{HistoryLog, SummaryRecord};
use crate::lifecycle::EndReason;
use crate::session::{SessionLog, Utterance};
use crate::store::{keys, KvStore};

pub struct Summarizer {
    sessions: SessionLog,
    history: HistoryLog,
    backend: Arc<dyn GenerativeBackend>,
    kv: Arc<dyn KvStore>,
    status: SummarizeStatusHandle,
    genai: GenAiConfig,
    summary: SummaryConfig,
}

impl Summarizer {
    pub fn new(
        sessions: SessionLog,
        history: HistoryLog,
        backend: Arc<dyn GenerativeBackend>,
        kv: Arc<dyn KvStore>,
        status: SummarizeStatusHandle,
        genai: GenAiConfig,
        summary: SummaryConfig,
    ) -> Self {
        Self {
            sessions,
            history,
            backend,
            kv,
            status,
            genai,
            summary,
        }
    }

    /// Close the session for `meeting_key` and produce one summary record.
    ///
    /// Idempotent at the session level: once a session has been drained, a
    /// repeated end signal resolves to `EmptySession` instead of a duplicate
    /// summary.
    pub async fn finalize(
        &self,
        meeting_key: &str,
        reason: EndReason,
    ) -> Result<SummaryRecord, SummarizeError> {
        let credential = match self.kv.get(keys::CREDENTIAL).await {
            Ok(Some(key)) if !key.trim().is_empty() => key,
            Ok(_) => {
                warn!("Finalize for {} refused: no API key configured", meeting_key);
                self.status.set_failed("MissingCredential").await;
                return Err(SummarizeError::MissingCredential);
            }
            Err(e) => return Err(SummarizeError::Transport(e.to_string())),
        };

        if self.sessions.len(meeting_key).await == 0 {
            return Err(SummarizeError::EmptySession);
        }

        // Snapshot the log; anything appended from here on belongs to the
        // next session for this key.
        let Some(snapshot) = self.sessions.take(meeting_key).await else {
            return Err(SummarizeError::EmptySession);
        };

        info!(
            "Finalizing meeting {} ({} utterances, reason: {})",
            meeting_key,
            snapshot.len(),
            reason.as_str()
        );
        self.status.begin(meeting_key).await;

        match self.run(meeting_key, reason, &snapshot, &credential).await {
            Ok(record) => {
                self.status.set_phase(SummarizePhase::Succeeded).await;
                Ok(record)
            }
            Err(e) => {
                // Leave the log intact and retryable.
                self.sessions.restore(meeting_key, snapshot).await;
                self.status.set_failed(e.code()).await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        meeting_key: &str,
        reason: EndReason,
        snapshot: &[Utterance],
        credential: &str,
    ) -> Result<SummaryRecord, SummarizeError> {
        let cleaned = preprocess(snapshot, &self.summary);

        let models = self.backend.discover(credential).await?;
        let model = pick_model(
            &models,
            &self.genai.preferred_models,
            &self.genai.economical_marker,
        )
        .ok_or(SummarizeError::DiscoveryUnavailable)?;

        info!("Selected model {} via {}", model.name, model.api_variant);
        self.status.set_phase(SummarizePhase::Generating).await;

        let summary_text = self
            .backend
            .generate(credential, model, &build_prompt(&cleaned))
            .await?;

        let record = SummaryRecord::new(
            meeting_key,
            format!("{}/{}", model.api_variant, model.name),
            reason,
            snapshot.len(),
            summary_text,
        );

        let transcript = format_transcript(snapshot);
        Ok(self.history.commit(record, &transcript).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactFile, ArtifactRef, ArtifactSink};
    use crate::genai::ModelDescriptor;
    use crate::store::MemoryKvStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeBackend {
        generations: AtomicUsize,
        fail_generation: bool,
    }

    impl FakeBackend {
        fn ok() -> Self {
            Self {
                generations: AtomicUsize::new(0),
                fail_generation: false,
            }
        }

        fn failing() -> Self {
            Self {
                generations: AtomicUsize::new(0),
                fail_generation: true,
            }
        }
    }

    #[async_trait]
    impl GenerativeBackend for FakeBackend {
        async fn discover(
            &self,
            _credential: &str,
        ) -> Result<Vec<ModelDescriptor>, SummarizeError> {
            Ok(vec![ModelDescriptor {
                name: "models/gemini-1.5-flash".to_string(),
                api_variant: "v1".to_string(),
                supports_generation: true,
            }])
        }

        async fn generate(
            &self,
            _credential: &str,
            _model: &ModelDescriptor,
            _prompt: &str,
        ) -> Result<String, SummarizeError> {
            self.generations.fetch_add(1, Ordering::SeqCst);
            if self.fail_generation {
                Err(SummarizeError::Generation("quota exceeded".into()))
            } else {
                Ok("# Overview\nwe decided X".to_string())
            }
        }
    }

    struct NullSink;

    #[async_trait]
    impl ArtifactSink for NullSink {
        async fn write(
            &self,
            folder_hint: &str,
            files: &[ArtifactFile<'_>],
        ) -> anyhow::Result<Vec<ArtifactRef>> {
            Ok(files
                .iter()
                .map(|f| ArtifactRef {
                    id: format!("{}/{}", folder_hint, f.name),
                    resolved_path: format!("/dev/null/{}", f.name),
                })
                .collect())
        }
    }

    fn summarizer(backend: FakeBackend) -> (Summarizer, SessionLog) {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let sessions = SessionLog::new(kv.clone(), 300, Duration::from_millis(10));
        let history = HistoryLog::new(kv.clone(), Arc::new(NullSink), 30);
        let s = Summarizer::new(
            sessions.clone(),
            history,
            Arc::new(backend),
            kv,
            SummarizeStatusHandle::default(),
            GenAiConfig::default(),
            SummaryConfig::default(),
        );
        (s, sessions)
    }

    async fn set_credential(s: &Summarizer) {
        s.kv.set(keys::CREDENTIAL, "test-key").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_credential_leaves_log_intact() {
        let (s, sessions) = summarizer(FakeBackend::ok());
        sessions.append("abc", Utterance::now(None, "Hello")).await;

        let err = s.finalize("abc", EndReason::LeaveControl).await.unwrap_err();
        assert_eq!(err, SummarizeError::MissingCredential);
        assert_eq!(sessions.len("abc").await, 1);
    }

    #[tokio::test]
    async fn test_empty_session_fails_fast() {
        let (s, _) = summarizer(FakeBackend::ok());
        set_credential(&s).await;

        let err = s.finalize("abc", EndReason::LeaveControl).await.unwrap_err();
        assert_eq!(err, SummarizeError::EmptySession);
    }

    #[tokio::test]
    async fn test_success_releases_session() {
        let (s, sessions) = summarizer(FakeBackend::ok());
        set_credential(&s).await;
        sessions.append("abc", Utterance::now(None, "we decided X")).await;

        let record = s.finalize("abc", EndReason::LeaveControl).await.unwrap();
        assert_eq!(record.meeting_key, "abc");
        assert_eq!(record.utterance_count, 1);
        assert!(record.summary_text.contains("decided X"));
        assert_eq!(sessions.len("abc").await, 0);
    }

    #[tokio::test]
    async fn test_second_finalize_is_empty_session_not_duplicate() {
        let (s, sessions) = summarizer(FakeBackend::ok());
        set_credential(&s).await;
        sessions.append("abc", Utterance::now(None, "Hello")).await;

        s.finalize("abc", EndReason::LeaveControl).await.unwrap();
        let err = s.finalize("abc", EndReason::PageUnload).await.unwrap_err();
        assert_eq!(err, SummarizeError::EmptySession);
    }

    #[tokio::test]
    async fn test_generation_failure_restores_snapshot() {
        let (s, sessions) = summarizer(FakeBackend::failing());
        set_credential(&s).await;
        sessions.append("abc", Utterance::now(None, "Hello")).await;
        sessions.append("abc", Utterance::now(None, "World")).await;

        let err = s.finalize("abc", EndReason::LeaveControl).await.unwrap_err();
        assert_eq!(err, SummarizeError::Generation("quota exceeded".into()));

        // Retryable: log intact after the failure.
        assert_eq!(sessions.len("abc").await, 2);
        assert_eq!(s.status.get().await.phase, SummarizePhase::Failed);
    }

    #[tokio::test]
    async fn test_model_used_records_variant_and_name() {
        let (s, sessions) = summarizer(FakeBackend::ok());
        set_credential(&s).await;
        sessions.append("abc", Utterance::now(None, "Hello")).await;

        let record = s.finalize("abc", EndReason::Manual).await.unwrap();
        assert_eq!(record.model_used, "v1/models/gemini-1.5-flash");
        assert_eq!(record.end_reason, EndReason::Manual);
    }
}
