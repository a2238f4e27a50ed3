//! Meeting identity and end-of-meeting detection.
//!
//! The host UI offers no single reliable lifecycle event, so several
//! redundant signals feed one fire-once guard per session: an explicit
//! leave control, a meeting-key change while active, page unload, or the
//! in-call indicator disappearing from a periodic poll. Whichever lands
//! first wins; the rest are ignored for that session.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    LeaveControl,
    KeyChanged,
    PageUnload,
    IndicatorLost,
    Manual,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeaveControl => "leave_control",
            Self::KeyChanged => "key_changed",
            Self::PageUnload => "page_unload",
            Self::IndicatorLost => "indicator_lost",
            Self::Manual => "manual",
        }
    }
}

/// A single end signal for a concrete session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndEvent {
    pub meeting_key: String,
    pub reason: EndReason,
}

/// Fire-once guard state for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndGuard {
    Active,
    Ending,
    Ended,
}

fn meeting_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Canonical three-part meeting code in the URL path.
    RE.get_or_init(|| Regex::new(r"(?i)/([a-z]{3}-[a-z]{4}-[a-z]{3})(?:[/?#]|$)").unwrap())
}

/// Derive a short stable key from the meeting address.
///
/// Prefers the canonical `xxx-xxxx-xxx` code; falls back to a sanitized
/// path, then `"unknown"`.
pub fn meeting_key_from_url(url: &str) -> String {
    if let Some(caps) = meeting_code_regex().captures(url) {
        return caps[1].to_lowercase();
    }

    let path = url
        .split_once("://")
        .and_then(|(_, rest)| rest.split_once('/'))
        .map(|(_, path)| path)
        .unwrap_or("");
    let path = path.split(['?', '#']).next().unwrap_or("");

    let sanitized: String = path
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let sanitized = sanitized.trim_matches('_').to_string();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// Label keywords for the leave/hang-up affordance (en/ja).
const LEAVE_KEYWORDS: &[&str] = &["leave call", "end call", "hang up", "退出", "通話を終了"];

/// Label keywords for the captions toggle (en/ja), used by embedding hosts
/// that auto-enable the caption surface.
const CAPTION_KEYWORDS: &[&str] = &[
    "caption",
    "captions",
    "subtitle",
    "subtitles",
    "字幕",
    "キャプション",
];

pub fn looks_like_leave_control(label: &str) -> bool {
    let label = label.to_lowercase();
    LEAVE_KEYWORDS.iter().any(|k| label.contains(k))
}

pub fn looks_like_caption_control(label: &str) -> bool {
    let label = label.to_lowercase();
    CAPTION_KEYWORDS.iter().any(|k| label.contains(k))
}

/// Tracks the current meeting key and emits at most one end event per
/// session, regardless of how many redundant signals fire.
#[derive(Debug)]
pub struct LifecycleTracker {
    meeting_key: String,
    guard: EndGuard,
}

impl LifecycleTracker {
    pub fn new(url: &str) -> Self {
        Self {
            meeting_key: meeting_key_from_url(url),
            guard: EndGuard::Active,
        }
    }

    pub fn meeting_key(&self) -> &str {
        &self.meeting_key
    }

    /// Signal that the current session ended. First signal wins.
    pub fn signal_end(&mut self, reason: EndReason) -> Option<EndEvent> {
        if self.guard != EndGuard::Active {
            return None;
        }
        self.guard = EndGuard::Ending;
        Some(EndEvent {
            meeting_key: self.meeting_key.clone(),
            reason,
        })
    }

    /// Mark the in-flight end signal as delivered.
    pub fn acknowledge_end(&mut self) {
        if self.guard == EndGuard::Ending {
            self.guard = EndGuard::Ended;
        }
    }

    /// Observe the current address. A key change while the session is still
    /// active means the previous meeting ended; the tracker re-arms for the
    /// new key.
    pub fn observe_url(&mut self, url: &str) -> Option<EndEvent> {
        let key = meeting_key_from_url(url);
        if key == self.meeting_key {
            return None;
        }

        let event = self.signal_end(EndReason::KeyChanged);
        self.meeting_key = key;
        self.guard = EndGuard::Active;
        event
    }
}
