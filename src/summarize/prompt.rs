//! Fixed-template prompt construction.

use crate::session::Utterance;

const INSTRUCTIONS: &str = "\
The following is the caption log of an online meeting that just ended.
Write meeting minutes in the same language as the log.
Prefer decisions, action items, and technical content over small talk.
Mark uncertain items explicitly as (unconfirmed) instead of inferring
identities or facts that the log does not state.

Use exactly this structure:

# Overview (3 lines)
# Decisions
- ...
# Action items
- ... (owner / deadline when known)
# Open concerns
- ...";

pub fn build_prompt(utterances: &[Utterance]) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\n\nCaption log:\n");
    for u in utterances {
        prompt.push_str(&format_line(u));
        prompt.push('\n');
    }
    prompt
}

/// Render one utterance as a transcript line.
pub fn format_line(utterance: &Utterance) -> String {
    match &utterance.speaker {
        Some(speaker) => format!("{}: {}", speaker, utterance.text),
        None => utterance.text.clone(),
    }
}

/// Render the full transcript artifact, one timestamped line per utterance.
pub fn format_transcript(utterances: &[Utterance]) -> String {
    utterances
        .iter()
        .map(|u| {
            format!(
                "[{}] {}",
                u.timestamp.format("%Y-%m-%d %H:%M:%S"),
                format_line(u)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
