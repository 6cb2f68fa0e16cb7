//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod media;
pub mod recording;
pub mod upload;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use media::{CombinedStream, ContainerFormat, MediaData, MediaSource, MediaTrack};
pub use recording::{Chunk, ChunkBuffer, Duration, RecordingLifecycle, RecordingState};
pub use upload::{StatusMessage, UploadState, UploadStatus};
