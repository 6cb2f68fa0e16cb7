//! Recording infrastructure module
//!
//! Encodes the combined stream with FFmpeg and delivers the WebM output as
//! chunks.

mod ffmpeg;

pub use ffmpeg::{FfmpegEngine, CHUNK_READ_SIZE};
