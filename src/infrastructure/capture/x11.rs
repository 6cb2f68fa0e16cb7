//! X11 display grant

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{CaptureGrant, GrantError};
use crate::domain::media::{InputSpec, MediaSource, MediaTrack, SourceKind, TrackKind};

/// Directory holding the sockets of local X servers
const X11_SOCKET_DIR: &str = "/tmp/.X11-unix";

/// Grants capture of an X11 display through ffmpeg's `x11grab` input
pub struct X11DisplayGrant {
    display: String,
    socket_dir: PathBuf,
}

impl X11DisplayGrant {
    /// Create a grant for `display` (e.g. ":0.0")
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            socket_dir: PathBuf::from(X11_SOCKET_DIR),
        }
    }

    #[cfg(test)]
    fn with_socket_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.socket_dir = dir.into();
        self
    }

    /// Display number of a local display name (":1.0" -> 1).
    /// Remote displays ("host:0") return None.
    fn local_display_number(display: &str) -> Option<u32> {
        let rest = display.strip_prefix(':')?;
        let number = rest.split('.').next()?;
        number.parse().ok()
    }
}

#[async_trait]
impl CaptureGrant for X11DisplayGrant {
    async fn acquire(&self) -> Result<MediaSource, GrantError> {
        if self.display.trim().is_empty() {
            return Err(GrantError::Unavailable("No display configured".to_string()));
        }

        if let Some(number) = Self::local_display_number(&self.display) {
            let socket = self.socket_dir.join(format!("X{}", number));
            if !tokio::fs::try_exists(&socket).await.unwrap_or(false) {
                return Err(GrantError::Unavailable(format!(
                    "X display {} is not running",
                    self.display
                )));
            }
        }

        debug!(display = %self.display, "display granted");
        let track = MediaTrack::new(
            TrackKind::Video,
            format!("screen {}", self.display),
            InputSpec::new("x11grab", self.display.clone()),
        );
        Ok(MediaSource::new(SourceKind::Display, vec![track]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_display_numbers() {
        assert_eq!(X11DisplayGrant::local_display_number(":0"), Some(0));
        assert_eq!(X11DisplayGrant::local_display_number(":1.0"), Some(1));
        assert_eq!(X11DisplayGrant::local_display_number("remote:0"), None);
        assert_eq!(X11DisplayGrant::local_display_number(":x"), None);
    }

    #[tokio::test]
    async fn grants_a_running_display() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("X3"), b"").unwrap();
        let grant = X11DisplayGrant::new(":3.0").with_socket_dir(dir.path());

        let source = grant.acquire().await.unwrap();
        assert_eq!(source.kind(), SourceKind::Display);
        assert_eq!(source.tracks().len(), 1);
        let track = &source.tracks()[0];
        assert_eq!(track.kind(), TrackKind::Video);
        assert_eq!(track.input(), &InputSpec::new("x11grab", ":3.0"));
        assert!(track.is_live());
    }

    #[tokio::test]
    async fn missing_display_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let grant = X11DisplayGrant::new(":7").with_socket_dir(dir.path());

        let err = grant.acquire().await.unwrap_err();
        assert!(matches!(err, GrantError::Unavailable(_)));
    }

    #[tokio::test]
    async fn remote_display_is_not_checked_locally() {
        let grant = X11DisplayGrant::new("build-host:0").with_socket_dir("/nonexistent");
        assert!(grant.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn blank_display_is_unavailable() {
        let grant = X11DisplayGrant::new("  ");
        assert!(grant.acquire().await.is_err());
    }
}
