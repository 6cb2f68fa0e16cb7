//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod capture;
pub mod controller;
pub mod ports;
pub mod upload;

// Re-export use cases
pub use capture::{CaptureError, CaptureSession, GrantedSources, CHUNK_CHANNEL_CAPACITY};
pub use controller::{ControllerError, DisplaySnapshot, RecorderController, ToggleOutcome};
pub use upload::{SubmitError, SubmitOutput, UploadConfig, UploadOrchestrator};
