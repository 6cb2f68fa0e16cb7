//! Artifact save port interface

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::media::MediaData;

/// Save errors
#[derive(Debug, Clone, Error)]
pub enum SaveError {
    #[error("Failed to create output directory: {0}")]
    DirectoryFailed(String),

    #[error("Failed to write file: {0}")]
    WriteFailed(String),
}

/// Port for handing a finished file to the user
#[async_trait]
pub trait ArtifactSaver: Send + Sync {
    /// Save `artifact` under a name derived from `file_name`.
    ///
    /// # Returns
    /// Where the file ended up
    async fn save(&self, artifact: &MediaData, file_name: &str) -> Result<PathBuf, SaveError>;
}

#[async_trait]
impl<T: ArtifactSaver + ?Sized> ArtifactSaver for Arc<T> {
    async fn save(&self, artifact: &MediaData, file_name: &str) -> Result<PathBuf, SaveError> {
        self.as_ref().save(artifact, file_name).await
    }
}
