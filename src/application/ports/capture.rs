//! Capture grant port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::media::MediaSource;

/// Grant errors
#[derive(Debug, Clone, Error)]
pub enum GrantError {
    #[error("Permission denied: {0}")]
    Denied(String),

    #[error("Device unavailable: {0}")]
    Unavailable(String),

    #[error("Grant failed: {0}")]
    Failed(String),
}

/// Port for a permission-gated capture device (screen or microphone).
#[async_trait]
pub trait CaptureGrant: Send + Sync {
    /// Ask for access to the device.
    ///
    /// # Returns
    /// A live source whose tracks stay open until it is released or dropped
    async fn acquire(&self) -> Result<MediaSource, GrantError>;
}
