//! Transcript cleanup before prompting.
//!
//! Quality heuristics, not correctness-critical: whitespace normalization,
//! folding self-reference speaker aliases into one label, dropping filler
//! acknowledgements, and clipping to the most recent window the request
//! budget allows.

use crate::config::SummaryConfig;
use crate::session::Utterance;

pub fn preprocess(utterances: &[Utterance], config: &SummaryConfig) -> Vec<Utterance> {
    let cleaned: Vec<Utterance> = utterances
        .iter()
        .map(|u| normalize(u, config))
        .filter(|u| !u.text.is_empty() && !is_filler(&u.text, config))
        .collect();

    // If the stoplist swallowed everything, fall back to the raw log rather
    // than prompting with nothing.
    let kept = if cleaned.is_empty() {
        utterances.to_vec()
    } else {
        cleaned
    };

    clip_last(kept, config.clip_last)
}

fn normalize(utterance: &Utterance, config: &SummaryConfig) -> Utterance {
    let text = utterance.text.split_whitespace().collect::<Vec<_>>().join(" ");

    let speaker = utterance.speaker.as_ref().map(|s| {
        let is_alias = config
            .self_aliases
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(s));
        if is_alias {
            config.speaker_label.clone()
        } else {
            s.clone()
        }
    });

    Utterance {
        timestamp: utterance.timestamp,
        speaker,
        text,
    }
}

fn is_filler(text: &str, config: &SummaryConfig) -> bool {
    let stripped = text
        .trim_matches(|c: char| c.is_ascii_punctuation() || c == '。' || c == '、')
        .to_lowercase();

    config
        .filler_stoplist
        .iter()
        .any(|f| f.to_lowercase() == stripped)
}

fn clip_last(mut utterances: Vec<Utterance>, limit: usize) -> Vec<Utterance> {
    if utterances.len() > limit {
        utterances.drain(..utterances.len() - limit);
    }
    utterances
}
