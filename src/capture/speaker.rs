//! Best-effort speaker extraction from a raw caption block.
//!
//! The host UI renders the speaker name on its own line above the spoken
//! text, or occasionally inline as `speaker: text`. Both layouts drift, so
//! this is a heuristic: a mis-split degrades the speaker label, never the
//! captured text.

use regex::Regex;
use std::sync::OnceLock;

const MAX_SPEAKER_LEN: usize = 40;

fn inline_speaker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ASCII or fullwidth colon after a short leading run.
    RE.get_or_init(|| Regex::new(r"^(.{1,40})[:：]\s*(.+)$").unwrap())
}

/// Split a speaker label out of a caption block.
///
/// `raw_block` is the unflattened region text, `full` the collapsed
/// snapshot, `diff` the increment computed against the previous snapshot.
/// When the diff covers the whole snapshot the spoken part excludes the
/// speaker label; a partial diff is already speaker-free suffix text.
pub fn split_speaker(raw_block: &str, full: &str, diff: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = raw_block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.len() >= 2 {
        let speaker = lines[0].to_string();
        let text = if diff == full {
            lines[1..].join(" ")
        } else {
            diff.to_string()
        };
        return (non_empty(speaker), text);
    }

    if let Some(caps) = inline_speaker_regex().captures(full) {
        let speaker = caps[1].trim().to_string();
        if speaker.chars().count() <= MAX_SPEAKER_LEN {
            let text = if diff == full {
                caps[2].trim().to_string()
            } else {
                diff.to_string()
            };
            return (non_empty(speaker), text);
        }
    }

    (None, diff.to_string())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
