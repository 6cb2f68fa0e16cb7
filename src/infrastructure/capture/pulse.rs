//! PulseAudio microphone grant

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::debug;

use crate::application::ports::{CaptureGrant, GrantError};
use crate::domain::media::{InputSpec, MediaSource, MediaTrack, SourceKind, TrackKind};

/// Grants microphone capture through ffmpeg's `pulse` input.
///
/// Acquiring checks that the system has an input device at all; the named
/// PulseAudio source is opened by the encoder.
pub struct PulseMicrophoneGrant {
    source: String,
}

impl PulseMicrophoneGrant {
    /// Create a grant for the PulseAudio source `source` (e.g. "default")
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Name of the default input device
    fn find_input_device() -> Result<String, GrantError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| GrantError::Unavailable("No microphone found".to_string()))?;
        Ok(device.name().unwrap_or_else(|_| "microphone".to_string()))
    }

    fn microphone_source(&self, device_name: &str) -> MediaSource {
        let track = MediaTrack::new(
            TrackKind::Audio,
            device_name,
            InputSpec::new("pulse", self.source.clone()),
        );
        MediaSource::new(SourceKind::Microphone, vec![track])
    }
}

#[async_trait]
impl CaptureGrant for PulseMicrophoneGrant {
    async fn acquire(&self) -> Result<MediaSource, GrantError> {
        // Device enumeration blocks
        let device_name = tokio::task::spawn_blocking(Self::find_input_device)
            .await
            .map_err(|e| GrantError::Failed(format!("Task join error: {}", e)))??;

        debug!(device = %device_name, source = %self.source, "microphone granted");
        Ok(self.microphone_source(&device_name))
    }
}
