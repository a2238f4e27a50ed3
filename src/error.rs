//! Failure taxonomy for the summarization pipeline.
//!
//! Every finalize attempt resolves to either a `SummaryRecord` or one of
//! these variants. The `code()` string is the stable identifier returned
//! over the message surface; display text is for logs and humans.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("no utterances recorded for this meeting")]
    EmptySession,

    #[error("no generation-capable model could be discovered")]
    DiscoveryUnavailable,

    #[error("model returned no extractable text")]
    EmptyGeneration,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("artifact persistence failed: {0}")]
    ArtifactPersistence(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl SummarizeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MissingCredential",
            Self::EmptySession => "EmptySession",
            Self::DiscoveryUnavailable => "DiscoveryUnavailable",
            Self::EmptyGeneration => "EmptyGeneration",
            Self::Generation(_) => "GenerationError",
            Self::ArtifactPersistence(_) => "ArtifactPersistenceFailed",
            Self::Transport(_) => "TransportError",
        }
    }
}
