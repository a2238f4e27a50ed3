//! Caption capture engine.
//!
//! Consumes snapshots of the host UI's cumulative caption text and turns
//! them into incremental utterances. Pure and synchronous: the embedding
//! surface feeds it raw region text, it never touches a rendering layer.

mod differ;
mod speaker;

pub use differ::{CaptionDiffer, CaptionIncrement};
pub use speaker::split_speaker;
