//! Snapshot diffing for a monotonically growing caption region.

use super::speaker::split_speaker;

/// One emitted caption increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionIncrement {
    pub speaker: Option<String>,
    pub text: String,
}

/// Tracks the last observed snapshot and emits the newly appended suffix.
///
/// The host UI usually extends the rendered transcript, so the increment is
/// the suffix beyond the previous snapshot. When the UI replaces the block
/// instead (speaker change resets it), the whole snapshot is re-emitted —
/// re-emitting beats silently dropping content.
#[derive(Debug, Default)]
pub struct CaptionDiffer {
    last_snapshot: String,
}

impl CaptionDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the current raw region text. Returns `None` when nothing new
    /// was said (empty, unchanged, or the diff trims to nothing).
    pub fn observe(&mut self, raw_region_text: &str) -> Option<CaptionIncrement> {
        let current = collapse_whitespace(raw_region_text);
        if current.is_empty() || current == self.last_snapshot {
            return None;
        }

        let diff = if let Some(suffix) = current.strip_prefix(self.last_snapshot.as_str()) {
            suffix.trim().to_string()
        } else {
            current.clone()
        };

        self.last_snapshot = current.clone();

        if diff.is_empty() {
            return None;
        }

        let (speaker, text) = split_speaker(raw_region_text, &current, &diff);
        if text.is_empty() {
            return None;
        }

        Some(CaptionIncrement { speaker, text })
    }

    pub fn reset(&mut self) {
        self.last_snapshot.clear();
    }
}

/// Flatten newlines and runs of whitespace into single spaces.
pub(super) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
