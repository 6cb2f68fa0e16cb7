//! Recorder controller
//!
//! The surface the interactive shell talks to: toggle, submit, save raw and
//! a snapshot of everything the display needs.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::media::human_readable_size;
use crate::domain::recording::ChunkBuffer;
use crate::domain::upload::{StatusMessage, RAW_RECORDING_FILE_NAME};

use super::capture::{CaptureError, CaptureSession};
use super::ports::{
    ArtifactSaver, CaptureGrant, ConversionService, Notifier, RecordingEngine, SaveError,
};
use super::upload::{SubmitError, SubmitOutput, UploadOrchestrator};

/// Errors surfaced to the shell
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Stop the recording first")]
    RecordingActive,

    #[error("Nothing recorded yet")]
    NothingRecorded,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("Could not save the recording: {0}")]
    Save(#[from] SaveError),
}

/// What a toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Stopped { chunks: usize, size: String },
}

/// Everything the display layer renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub recording: bool,
    pub chunk_count: usize,
    pub loading: bool,
    pub status_message: Option<StatusMessage>,
}

pub struct RecorderController<D, M, E, C, S, N>
where
    D: CaptureGrant,
    M: CaptureGrant,
    E: RecordingEngine,
    C: ConversionService,
    S: ArtifactSaver,
    N: Notifier,
{
    capture: CaptureSession<D, M, E>,
    uploads: UploadOrchestrator<C, S, N>,
    saver: S,
}

impl<D, M, E, C, S, N> RecorderController<D, M, E, C, S, N>
where
    D: CaptureGrant,
    M: CaptureGrant,
    E: RecordingEngine,
    C: ConversionService,
    S: ArtifactSaver,
    N: Notifier,
{
    /// `saver` is used for raw recordings; converted files go through the
    /// orchestrator's own saver.
    pub fn new(
        capture: CaptureSession<D, M, E>,
        uploads: UploadOrchestrator<C, S, N>,
        saver: S,
    ) -> Self {
        Self {
            capture,
            uploads,
            saver,
        }
    }

    pub fn capture(&self) -> &CaptureSession<D, M, E> {
        &self.capture
    }

    pub fn uploads(&self) -> &UploadOrchestrator<C, S, N> {
        &self.uploads
    }

    /// Stop if recording, otherwise start a new recording
    pub async fn toggle_recording(&mut self) -> Result<ToggleOutcome, ControllerError> {
        if self.capture.is_recording() {
            self.stop_recording().await
        } else {
            self.capture.start().await?;
            Ok(ToggleOutcome::Started)
        }
    }

    /// Settle a recording whose engine ended without being asked to.
    ///
    /// Returns None while the recording is healthy (or not running). Otherwise
    /// the session is stopped, keeping whatever was delivered, and the result
    /// of stopping is returned.
    pub async fn check_engine(&mut self) -> Option<Result<ToggleOutcome, ControllerError>> {
        if !self.capture.engine_ended() {
            return None;
        }
        warn!("recording engine ended unexpectedly");
        Some(self.stop_recording().await)
    }

    /// Convert the finished recording. The recording is discarded once the
    /// converted file is saved and kept for another attempt otherwise.
    pub async fn submit_for_conversion(&mut self) -> Result<SubmitOutput, ControllerError> {
        let recording = self.finished_recording()?;
        let output = self.uploads.submit(&recording).await?;
        self.capture.reset()?;
        Ok(output)
    }

    /// Save the recording as-is, without conversion, then discard it
    pub async fn save_raw_recording(&mut self) -> Result<PathBuf, ControllerError> {
        let recording = self.finished_recording()?;
        let path = self
            .saver
            .save(&recording.to_payload(), RAW_RECORDING_FILE_NAME)
            .await?;
        self.capture.reset()?;
        info!(path = %path.display(), "raw recording saved");
        Ok(path)
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            recording: self.capture.is_recording(),
            chunk_count: self.capture.chunk_count(),
            loading: self.uploads.is_loading(),
            status_message: self.uploads.status_message(),
        }
    }

    /// Whether the convert action should be offered
    pub fn can_submit(&self) -> bool {
        !self.capture.is_active() && self.capture.chunk_count() > 0 && !self.uploads.is_loading()
    }

    /// Stop any live recording before exit
    pub async fn shutdown(&mut self) -> Result<(), ControllerError> {
        self.capture.shutdown().await?;
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<ToggleOutcome, ControllerError> {
        self.capture.stop().await?;
        Ok(ToggleOutcome::Stopped {
            chunks: self.capture.chunk_count(),
            size: human_readable_size(self.capture.total_bytes()),
        })
    }

    fn finished_recording(&self) -> Result<ChunkBuffer, ControllerError> {
        if self.capture.is_active() {
            return Err(ControllerError::RecordingActive);
        }
        let recording = self.capture.snapshot();
        if recording.is_empty() {
            return Err(ControllerError::NothingRecorded);
        }
        Ok(recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::capture::tests::{MockEngine, MockGrant};
    use crate::application::ports::{SilentNotifier, UploadError};
    use crate::application::upload::tests::{MockConverter, MockSaver};
    use crate::application::upload::UploadConfig;
    use crate::domain::upload::{StatusKind, SUCCESS_MESSAGE};

    type TestController = RecorderController<
        MockGrant,
        MockGrant,
        MockEngine,
        MockConverter,
        MockSaver,
        SilentNotifier,
    >;

    fn controller(
        engine: MockEngine,
        converter: MockConverter,
        saver: MockSaver,
    ) -> TestController {
        let capture = CaptureSession::new(MockGrant::display(), MockGrant::microphone(), engine);
        let uploads = UploadOrchestrator::new(
            converter,
            saver.clone(),
            SilentNotifier,
            UploadConfig::default(),
        );
        RecorderController::new(capture, uploads, saver)
    }

    #[tokio::test]
    async fn toggle_starts_then_stops() {
        let mut controller = controller(
            MockEngine::with_chunks(&[10, 20], &[30]),
            MockConverter::ok(b"mp4"),
            MockSaver::default(),
        );

        assert_eq!(controller.toggle_recording().await.unwrap(), ToggleOutcome::Started);
        assert!(controller.snapshot().recording);

        let outcome = controller.toggle_recording().await.unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome::Stopped {
                chunks: 3,
                size: "60 B".to_string()
            }
        );
        assert!(!controller.snapshot().recording);
        assert!(controller.can_submit());
    }

    #[tokio::test]
    async fn successful_conversion_clears_the_recording() {
        let saver = MockSaver::default();
        let mut controller = controller(
            MockEngine::with_chunks(&[10, 20], &[30]),
            MockConverter::ok(&[0u8; 4096]),
            saver.clone(),
        );
        controller.toggle_recording().await.unwrap();
        controller.toggle_recording().await.unwrap();

        controller.submit_for_conversion().await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.chunk_count, 0);
        assert!(!snapshot.loading);
        let message = snapshot.status_message.unwrap();
        assert_eq!(message.kind, StatusKind::Success);
        assert_eq!(message.text, SUCCESS_MESSAGE);
        assert_eq!(saver.saved(), vec![("converted-video.mp4".to_string(), 4096)]);
        assert!(!controller.can_submit());
    }

    #[tokio::test]
    async fn failed_conversion_keeps_the_recording() {
        let mut controller = controller(
            MockEngine::with_chunks(&[10], &[]),
            MockConverter::failing(UploadError::Rejected {
                status: 502,
                message: "bad gateway".to_string(),
            }),
            MockSaver::default(),
        );
        controller.toggle_recording().await.unwrap();
        controller.toggle_recording().await.unwrap();

        let err = controller.submit_for_conversion().await.unwrap_err();
        assert!(matches!(err, ControllerError::Submit(SubmitError::Upload(_))));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.chunk_count, 1);
        assert_eq!(snapshot.status_message.unwrap().kind, StatusKind::Failure);
        assert!(controller.can_submit());
    }

    #[tokio::test]
    async fn submit_refused_while_recording() {
        let converter = MockConverter::ok(b"mp4");
        let mut controller = controller(
            MockEngine::with_chunks(&[10], &[]),
            converter.clone(),
            MockSaver::default(),
        );
        controller.toggle_recording().await.unwrap();

        let err = controller.submit_for_conversion().await.unwrap_err();
        assert!(matches!(err, ControllerError::RecordingActive));
        assert!(!controller.can_submit());
        assert_eq!(converter.calls(), 0);
        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn submit_refused_without_recording() {
        let mut controller = controller(
            MockEngine::default(),
            MockConverter::ok(b"mp4"),
            MockSaver::default(),
        );
        let err = controller.submit_for_conversion().await.unwrap_err();
        assert!(matches!(err, ControllerError::NothingRecorded));
    }

    #[tokio::test]
    async fn raw_recording_is_saved_and_cleared() {
        let saver = MockSaver::default();
        let mut controller = controller(
            MockEngine::with_chunks(&[3, 4], &[]),
            MockConverter::ok(b"mp4"),
            saver.clone(),
        );
        controller.toggle_recording().await.unwrap();
        controller.toggle_recording().await.unwrap();

        let path = controller.save_raw_recording().await.unwrap();

        assert!(path.ends_with("screen-recording.webm"));
        assert_eq!(saver.saved(), vec![("screen-recording.webm".to_string(), 7)]);
        assert_eq!(controller.snapshot().chunk_count, 0);
    }

    #[tokio::test]
    async fn failed_raw_save_keeps_the_recording() {
        let mut controller = controller(
            MockEngine::with_chunks(&[3], &[]),
            MockConverter::ok(b"mp4"),
            MockSaver::failing(),
        );
        controller.toggle_recording().await.unwrap();
        controller.toggle_recording().await.unwrap();

        let err = controller.save_raw_recording().await.unwrap_err();
        assert!(matches!(err, ControllerError::Save(_)));
        assert_eq!(controller.snapshot().chunk_count, 1);
    }

    #[tokio::test]
    async fn shutdown_stops_a_live_recording() {
        let mut controller = controller(
            MockEngine::with_chunks(&[1], &[2]),
            MockConverter::ok(b"mp4"),
            MockSaver::default(),
        );
        controller.toggle_recording().await.unwrap();

        controller.shutdown().await.unwrap();
        assert!(!controller.snapshot().recording);
        assert_eq!(controller.snapshot().chunk_count, 2);
    }

    #[tokio::test]
    async fn crashed_engine_is_settled_by_check() {
        let mut controller = controller(
            MockEngine::with_chunks(&[5, 5], &[]).dying(),
            MockConverter::ok(b"mp4"),
            MockSaver::default(),
        );
        controller.toggle_recording().await.unwrap();

        let mut settled = None;
        for _ in 0..100 {
            settled = controller.check_engine().await;
            if settled.is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }

        let err = settled.expect("engine end not detected").unwrap_err();
        assert!(matches!(err, ControllerError::Capture(CaptureError::Engine(_))));
        let snapshot = controller.snapshot();
        assert!(!snapshot.recording);
        assert_eq!(snapshot.chunk_count, 2);
        assert!(controller.can_submit());
        assert!(controller.check_engine().await.is_none());
    }

    #[tokio::test]
    async fn check_is_quiet_for_a_healthy_recording() {
        let mut controller = controller(
            MockEngine::with_chunks(&[1], &[2]),
            MockConverter::ok(b"mp4"),
            MockSaver::default(),
        );
        assert!(controller.check_engine().await.is_none());

        controller.toggle_recording().await.unwrap();
        assert!(controller.check_engine().await.is_none());
        assert!(controller.snapshot().recording);
        controller.shutdown().await.unwrap();
    }
}
