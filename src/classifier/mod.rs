//! Remote genre classifier: wire contracts and the client seam.
//!
//! The stabilizer never talks to the network. The streaming runtime submits
//! encoded chunks through [`Classifier`] and feeds the decoded payloads to the
//! pipeline, so tests can swap in a scripted classifier.

#[cfg(feature = "http")]
mod http;
mod protocol;

#[cfg(feature = "http")]
pub use http::HttpClassifier;
pub use protocol::{ChunkPayload, ChunkReading, ClipPrediction};

use crate::log_debug;
use anyhow::Result;

/// Blocking classifier interface used by the CLI and the streaming worker.
pub trait Classifier {
    /// Classify a whole audio file.
    fn classify_clip(&self, file_name: &str, bytes: Vec<u8>) -> Result<ClipPrediction>;

    /// Submit one encoded WAV chunk of the live stream.
    fn classify_chunk(&self, wav: Vec<u8>) -> Result<ChunkPayload>;

    /// Ask the backend to drop any buffered stream audio.
    fn reset_stream(&self) -> Result<()>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify_clip(&self, file_name: &str, bytes: Vec<u8>) -> Result<ClipPrediction> {
        (**self).classify_clip(file_name, bytes)
    }

    fn classify_chunk(&self, wav: Vec<u8>) -> Result<ChunkPayload> {
        (**self).classify_chunk(wav)
    }

    fn reset_stream(&self) -> Result<()> {
        (**self).reset_stream()
    }
}

/// Reset the backend's stream buffer. Failure is logged and otherwise ignored;
/// returns whether the reset went through.
pub fn reset_remote_session<C: Classifier + ?Sized>(classifier: &C) -> bool {
    match classifier.reset_stream() {
        Ok(()) => true,
        Err(err) => {
            log_debug(&format!("reset_stream failed (continuing): {err:#}"));
            tracing::warn!(error = %err, "classifier stream reset failed");
            false
        }
    }
}
