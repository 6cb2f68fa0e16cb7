//! Recording engine port interfaces

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::media::CombinedStream;
use crate::domain::recording::Chunk;

/// Recording engine errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("FFmpeg not found. Please install FFmpeg.")]
    EncoderNotFound,

    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),
}

/// Producer end of the chunk channel. The engine owns it for the lifetime of
/// one recording and drops it once the final chunk has been sent.
pub type ChunkSink = mpsc::Sender<Chunk>;

/// Port for the encoder bound to a combined stream
#[async_trait]
pub trait RecordingEngine: Send + Sync {
    /// Begin encoding `stream`, delivering data fragments to `sink` in the
    /// order they are produced.
    async fn start(
        &self,
        stream: &CombinedStream,
        sink: ChunkSink,
    ) -> Result<Box<dyn EngineHandle>, RecordingError>;
}

/// A live recording
#[async_trait]
pub trait EngineHandle: Send {
    /// Finish the recording. Every pending fragment is delivered to the sink
    /// before this returns; the sink is closed afterwards.
    async fn finalize(self: Box<Self>) -> Result<(), RecordingError>;
}
