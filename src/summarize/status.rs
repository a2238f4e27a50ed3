//! Summarization phase tracking, shared with the API surface.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizePhase {
    Idle,
    Discovering,
    Generating,
    Succeeded,
    Failed,
}

impl SummarizePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Generating => "generating",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizeStatus {
    pub phase: SummarizePhase,
    pub meeting_key: Option<String>,
    pub last_error: Option<String>,
}

impl Default for SummarizeStatus {
    fn default() -> Self {
        Self {
            phase: SummarizePhase::Idle,
            meeting_key: None,
            last_error: None,
        }
    }
}

/// Shared view of the pipeline phase. Terminal phases (`Succeeded`,
/// `Failed`) stay visible as the last outcome until the next `begin`
/// resets the handle for a new cycle.
#[derive(Clone, Default)]
pub struct SummarizeStatusHandle {
    inner: Arc<Mutex<SummarizeStatus>>,
}

impl SummarizeStatusHandle {
    pub async fn get(&self) -> SummarizeStatus {
        self.inner.lock().await.clone()
    }

    pub async fn begin(&self, meeting_key: &str) {
        let mut state = self.inner.lock().await;
        state.phase = SummarizePhase::Discovering;
        state.meeting_key = Some(meeting_key.to_string());
        state.last_error = None;
    }

    pub async fn set_phase(&self, phase: SummarizePhase) {
        self.inner.lock().await.phase = phase;
    }

    pub async fn set_failed(&self, error: &str) {
        let mut state = self.inner.lock().await;
        state.phase = SummarizePhase::Failed;
        state.last_error = Some(error.to_string());
    }
}
