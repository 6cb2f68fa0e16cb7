//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;

/// Conversion service used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "https://screen-recorder-backend.onrender.com";

/// Default X11 display captured when `$DISPLAY` is unset
pub const DEFAULT_DISPLAY: &str = ":0.0";

/// Default PulseAudio source
pub const DEFAULT_MICROPHONE: &str = "default";

/// Capture device configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub display: Option<String>,
    pub microphone: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    pub upload_timeout: Option<String>,
    pub message_duration: Option<String>,
    pub output_dir: Option<String>,
    pub notify: Option<bool>,
    pub capture: Option<CaptureConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            upload_timeout: Some(Duration::default_upload_timeout().to_string()),
            message_duration: Some(Duration::default_message_duration().to_string()),
            output_dir: None,
            notify: Some(false),
            capture: Some(CaptureConfig {
                display: None,
                microphone: Some(DEFAULT_MICROPHONE.to_string()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            endpoint: other.endpoint.or(self.endpoint),
            upload_timeout: other.upload_timeout.or(self.upload_timeout),
            message_duration: other.message_duration.or(self.message_duration),
            output_dir: other.output_dir.or(self.output_dir),
            notify: other.notify.or(self.notify),
            capture: Self::merge_capture_config(self.capture, other.capture),
        }
    }

    fn merge_capture_config(
        base: Option<CaptureConfig>,
        other: Option<CaptureConfig>,
    ) -> Option<CaptureConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(CaptureConfig {
                display: o.display.or(b.display),
                microphone: o.microphone.or(b.microphone),
            }),
        }
    }

    /// Get the endpoint origin, without a trailing slash
    pub fn endpoint_or_default(&self) -> String {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/')
            .to_string()
    }

    /// Get upload_timeout as parsed Duration, or default if not set/invalid
    pub fn upload_timeout_or_default(&self) -> Duration {
        self.upload_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_upload_timeout)
    }

    /// Get message_duration as parsed Duration, or default if not set/invalid
    pub fn message_duration_or_default(&self) -> Duration {
        self.message_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_message_duration)
    }

    /// Get the directory saved files go to: configured, else the user's
    /// download directory, else the working directory
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Get the display to capture: configured, else `$DISPLAY`, else ":0.0"
    pub fn display_or_default(&self) -> String {
        self.capture
            .as_ref()
            .and_then(|c| c.display.clone())
            .or_else(|| std::env::var("DISPLAY").ok().filter(|d| !d.is_empty()))
            .unwrap_or_else(|| DEFAULT_DISPLAY.to_string())
    }

    /// Get the microphone source, or "default" if not set
    pub fn microphone_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.microphone.as_deref())
            .unwrap_or(DEFAULT_MICROPHONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.endpoint.as_deref(), Some(DEFAULT_ENDPOINT));
        assert_eq!(config.upload_timeout.as_deref(), Some("2m"));
        assert_eq!(config.message_duration.as_deref(), Some("2500ms"));
        assert_eq!(config.notify, Some(false));
        assert_eq!(config.microphone_or_default(), "default");
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.endpoint.is_none());
        assert!(config.upload_timeout.is_none());
        assert!(config.output_dir.is_none());
        assert!(config.capture.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            endpoint: Some("https://base.example".to_string()),
            upload_timeout: Some("30s".to_string()),
            ..Default::default()
        };
        let other = AppConfig {
            endpoint: Some("https://other.example".to_string()),
            upload_timeout: None,
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.endpoint.as_deref(), Some("https://other.example"));
        assert_eq!(merged.upload_timeout.as_deref(), Some("30s"));
    }

    #[test]
    fn merge_capture_config_fields() {
        let base = AppConfig {
            capture: Some(CaptureConfig {
                display: Some(":1".to_string()),
                microphone: Some("default".to_string()),
            }),
            ..Default::default()
        };
        let other = AppConfig {
            capture: Some(CaptureConfig {
                display: None,
                microphone: Some("alsa_input.usb".to_string()),
            }),
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.display_or_default(), ":1");
        assert_eq!(merged.microphone_or_default(), "alsa_input.usb");
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let config = AppConfig {
            endpoint: Some("http://localhost:3000/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint_or_default(), "http://localhost:3000");
    }

    #[test]
    fn blank_endpoint_falls_back_to_default() {
        let config = AppConfig {
            endpoint: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint_or_default(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn durations_parse_or_default() {
        let config = AppConfig {
            upload_timeout: Some("45s".to_string()),
            message_duration: Some("invalid".to_string()),
            ..Default::default()
        };
        assert_eq!(config.upload_timeout_or_default().as_secs(), 45);
        assert_eq!(config.message_duration_or_default().as_millis(), 2500);
    }

    #[test]
    fn output_dir_uses_configured_path() {
        let config = AppConfig {
            output_dir: Some("/tmp/recordings".to_string()),
            ..Default::default()
        };
        assert_eq!(config.output_dir_or_default(), PathBuf::from("/tmp/recordings"));
    }

    #[test]
    fn configured_display_wins() {
        let config = AppConfig {
            capture: Some(CaptureConfig {
                display: Some(":2.0".to_string()),
                microphone: None,
            }),
            ..Default::default()
        };
        assert_eq!(config.display_or_default(), ":2.0");
    }

    #[test]
    fn notify_defaults_to_false() {
        assert!(!AppConfig::empty().notify_or_default());
    }
}
