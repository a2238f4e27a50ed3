//! End-to-end pipeline tests: capture → session log → finalize → history,
//! driven through the service message boundary with scripted collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use meetnote::artifacts::{ArtifactFile, ArtifactRef, ArtifactSink};
use meetnote::capture::CaptionDiffer;
use meetnote::config::{GenAiConfig, SummaryConfig};
use meetnote::error::SummarizeError;
use meetnote::genai::{GenerativeBackend, ModelDescriptor};
use meetnote::history::HistoryLog;
use meetnote::lifecycle::{meeting_key_from_url, EndReason, LifecycleTracker};
use meetnote::service::{Service, ServiceHandle};
use meetnote::session::SessionLog;
use meetnote::store::{KvStore, MemoryKvStore};
use meetnote::summarize::{SummarizeStatusHandle, Summarizer};

struct ScriptedBackend {
    fail_generation: bool,
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn discover(&self, _credential: &str) -> Result<Vec<ModelDescriptor>, SummarizeError> {
        Ok(vec![
            ModelDescriptor {
                name: "models/gemini-pro".to_string(),
                api_variant: "v1".to_string(),
                supports_generation: true,
            },
            ModelDescriptor {
                name: "models/gemini-1.5-flash".to_string(),
                api_variant: "v1".to_string(),
                supports_generation: true,
            },
        ])
    }

    async fn generate(
        &self,
        _credential: &str,
        _model: &ModelDescriptor,
        prompt: &str,
    ) -> Result<String, SummarizeError> {
        if self.fail_generation {
            return Err(SummarizeError::Generation("quota exceeded".into()));
        }
        // Echo a marker from the prompt so tests can assert the log went in.
        let marker = if prompt.contains("We decided X") {
            "We decided X"
        } else {
            "nothing notable"
        };
        Ok(format!("# Overview\n{marker}"))
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
                resolved_path: format!("/artifacts/{}/{}", folder_hint, f.name),
            })
            .collect())
    }
}

struct FailingSink;

#[async_trait]
impl ArtifactSink for FailingSink {
    async fn write(
        &self,
        _folder_hint: &str,
        _files: &[ArtifactFile<'_>],
    ) -> anyhow::Result<Vec<ArtifactRef>> {
        anyhow::bail!("document store unreachable")
    }
}

fn build_service(
    backend: impl GenerativeBackend + 'static,
    sink: impl ArtifactSink + 'static,
) -> (ServiceHandle, Arc<MemoryKvStore>) {
    let kv_impl = Arc::new(MemoryKvStore::new());
    let kv: Arc<dyn KvStore> = kv_impl.clone();

    let sessions = SessionLog::new(kv.clone(), 300, Duration::from_millis(10));
    let history = HistoryLog::new(kv.clone(), Arc::new(sink), 30);
    let summarizer = Summarizer::new(
        sessions.clone(),
        history.clone(),
        Arc::new(backend),
        kv.clone(),
        SummarizeStatusHandle::default(),
        GenAiConfig::default(),
        SummaryConfig::default(),
    );

    let (handle, _task) = Service::new(sessions, history, summarizer, kv).spawn();
    (handle, kv_impl)
}

#[tokio::test]
async fn end_to_end_summary_from_deduped_log() {
    let (handle, _kv) = build_service(
        ScriptedBackend {
            fail_generation: false,
        },
        NullSink,
    );

    handle.set_credential("test-key".into()).await;
    handle.log("abc123", "Hello", None).await;
    handle.log("abc123", "Hello", None).await; // deduped
    handle.log("abc123", "We decided X", None).await;

    let record = handle
        .finalize("abc123", EndReason::LeaveControl)
        .await
        .unwrap();

    assert_eq!(record.meeting_key, "abc123");
    assert_eq!(record.utterance_count, 2);
    assert!(record.summary_text.contains("We decided X"));
    assert!(record.artifacts.is_some());

    // The session is gone: a second end signal is a clean EmptySession.
    let err = handle
        .finalize("abc123", EndReason::PageUnload)
        .await
        .unwrap_err();
    assert_eq!(err, SummarizeError::EmptySession);

    // Exactly one record in history, retrievable both ways.
    let history = handle.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(handle.last_summary().await.unwrap().id, record.id);
}

#[tokio::test]
async fn missing_credential_keeps_log_for_retry() {
    let (handle, _kv) = build_service(
        ScriptedBackend {
            fail_generation: false,
        },
        NullSink,
    );

    handle.log("abc123", "Hello", None).await;

    let err = handle
        .finalize("abc123", EndReason::LeaveControl)
        .await
        .unwrap_err();
    assert_eq!(err, SummarizeError::MissingCredential);

    // Configure a key and retry: the earlier log is still there.
    handle.set_credential("test-key".into()).await;
    let record = handle.finalize("abc123", EndReason::Manual).await.unwrap();
    assert_eq!(record.utterance_count, 1);
    assert_eq!(record.end_reason, EndReason::Manual);
}

#[tokio::test]
async fn artifact_failure_still_yields_retrievable_summary() {
    let (handle, _kv) = build_service(
        ScriptedBackend {
            fail_generation: false,
        },
        FailingSink,
    );

    handle.set_credential("test-key".into()).await;
    handle.log("abc123", "We decided X", None).await;

    let record = handle
        .finalize("abc123", EndReason::LeaveControl)
        .await
        .unwrap();

    assert!(record.artifacts.is_none());
    assert!(record
        .artifact_warning
        .as_deref()
        .unwrap()
        .contains("document store unreachable"));

    let history = handle.history().await;
    assert_eq!(history.len(), 1);
    assert!(history[0].artifact_warning.is_some());
}

#[tokio::test]
async fn generation_failure_is_retryable() {
    let (handle, _kv) = build_service(
        ScriptedBackend {
            fail_generation: true,
        },
        NullSink,
    );

    handle.set_credential("test-key".into()).await;
    handle.log("abc123", "Hello", None).await;

    let err = handle
        .finalize("abc123", EndReason::IndicatorLost)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "GenerationError");

    // Nothing recorded, log intact for a later manual retry.
    assert!(handle.history().await.is_empty());
    let err = handle.finalize("abc123", EndReason::Manual).await.unwrap_err();
    assert_eq!(err.code(), "GenerationError");
}

#[tokio::test]
async fn clear_all_wipes_sessions_and_history() {
    let (handle, _kv) = build_service(
        ScriptedBackend {
            fail_generation: false,
        },
        NullSink,
    );

    handle.set_credential("test-key".into()).await;
    handle.log("abc123", "Hello", None).await;
    handle.finalize("abc123", EndReason::LeaveControl).await.unwrap();
    handle.log("xyz789", "next meeting", None).await;

    handle.clear_all().await;

    assert!(handle.history().await.is_empty());
    assert!(handle.last_summary().await.is_none());
    let err = handle
        .finalize("xyz789", EndReason::LeaveControl)
        .await
        .unwrap_err();
    assert_eq!(err, SummarizeError::EmptySession);
}

#[tokio::test]
async fn capture_side_feeds_the_pipeline() {
    let (handle, _kv) = build_service(
        ScriptedBackend {
            fail_generation: false,
        },
        NullSink,
    );
    handle.set_credential("test-key".into()).await;

    // Simulated meeting page: derive the key, diff caption snapshots, then
    // signal the end exactly once.
    let url = "https://meet.example.com/abc-defg-hij";
    let mut tracker = LifecycleTracker::new(url);
    let mut differ = CaptionDiffer::new();

    let snapshots = [
        "Alice\nwe should ship",
        "Alice\nwe should ship on Friday",
        "Alice\nwe should ship on Friday We decided X",
    ];
    for snapshot in snapshots {
        if let Some(inc) = differ.observe(snapshot) {
            handle
                .log(tracker.meeting_key(), &inc.text, inc.speaker)
                .await;
        }
    }

    let event = tracker.signal_end(EndReason::LeaveControl).unwrap();
    assert!(tracker.signal_end(EndReason::PageUnload).is_none());

    let record = handle
        .finalize(&event.meeting_key, event.reason)
        .await
        .unwrap();
    tracker.acknowledge_end();

    assert_eq!(record.meeting_key, meeting_key_from_url(url));
    assert_eq!(record.utterance_count, 3);
    assert!(record.summary_text.contains("We decided X"));
}
