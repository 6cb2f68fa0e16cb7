//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like FFmpeg, X11, PulseAudio and the
//! conversion service.

pub mod capture;
pub mod config;
pub mod conversion;
pub mod notification;
pub mod recording;
pub mod storage;

// Re-export adapters
pub use capture::{PulseMicrophoneGrant, X11DisplayGrant};
pub use config::XdgConfigStore;
pub use conversion::HttpConversionClient;
pub use notification::{create_notifier, NotifyRustNotifier};
pub use recording::FfmpegEngine;
pub use storage::DirectorySaver;
