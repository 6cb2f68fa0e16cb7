//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod converter;
pub mod engine;
pub mod notifier;
pub mod saver;

// Re-export common types
pub use capture::{CaptureGrant, GrantError};
pub use config::ConfigStore;
pub use converter::{ConversionService, UploadError};
pub use engine::{ChunkSink, EngineHandle, RecordingEngine, RecordingError};
pub use notifier::{NotificationError, NotificationIcon, Notifier, SilentNotifier};
pub use saver::{ArtifactSaver, SaveError};
