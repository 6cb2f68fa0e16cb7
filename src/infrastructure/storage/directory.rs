//! Directory artifact saver

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::application::ports::{ArtifactSaver, SaveError};
use crate::domain::media::MediaData;

/// Give up after this many name collisions
const MAX_ATTEMPTS: u32 = 10_000;

/// Saves files into one directory without overwriting anything already
/// there: `name.ext`, then `name (1).ext`, `name (2).ext`, ...
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate file name for the given attempt
    fn candidate(file_name: &str, attempt: u32) -> String {
        if attempt == 0 {
            return file_name.to_string();
        }
        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        match path.extension() {
            Some(ext) => format!("{} ({}).{}", stem, attempt, ext.to_string_lossy()),
            None => format!("{} ({})", stem, attempt),
        }
    }
}

#[async_trait]
impl ArtifactSaver for DirectorySaver {
    async fn save(&self, artifact: &MediaData, file_name: &str) -> Result<PathBuf, SaveError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SaveError::DirectoryFailed(format!("{}: {}", self.dir.display(), e)))?;

        for attempt in 0..MAX_ATTEMPTS {
            let path = self.dir.join(Self::candidate(file_name, attempt));

            // create_new fails on an existing file instead of truncating it
            let file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(SaveError::WriteFailed(format!("{}: {}", path.display(), e)))
                }
            };

            write_or_remove(&path, file, artifact.data()).await?;

            debug!(path = %path.display(), bytes = artifact.size_bytes(), "file saved");
            return Ok(path);
        }

        Err(SaveError::WriteFailed(format!(
            "No free file name for {} in {}",
            file_name,
            self.dir.display()
        )))
    }
}

/// Write `data` through `writer` into the freshly created `path`.
/// A partial file is removed so it cannot pass for a finished download.
async fn write_or_remove<W>(path: &Path, mut writer: W, data: &[u8]) -> Result<(), SaveError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(data).await?;
        writer.flush().await
    }
    .await;

    let Err(e) = written else {
        return Ok(());
    };

    drop(writer);
    if let Err(remove_err) = fs::remove_file(path).await {
        warn!(path = %path.display(), error = %remove_err, "could not remove partial file");
    }
    Err(SaveError::WriteFailed(format!("{}: {}", path.display(), e)))
}
