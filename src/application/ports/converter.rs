//! Conversion service port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::media::MediaData;

/// Errors from one upload/convert exchange
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// Connection refused, DNS failure, timeout and the like
    #[error("Upload failed: {0}")]
    Transport(String),

    #[error("Conversion rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid conversion response: {0}")]
    MalformedBody(String),
}

impl UploadError {
    /// True for network-level failures
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Port for the remote conversion service
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Upload the recorded payload and return the converted artifact.
    ///
    /// Exactly one request is made per call.
    async fn convert(&self, payload: &MediaData) -> Result<MediaData, UploadError>;
}
