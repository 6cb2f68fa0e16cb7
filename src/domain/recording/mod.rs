//! Recording domain module

mod chunk;
mod duration;
mod lifecycle;

pub use chunk::{Chunk, ChunkBuffer};
pub use duration::Duration;
pub use lifecycle::{InvalidStateTransition, RecordingLifecycle, RecordingState};
