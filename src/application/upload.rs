//! Upload and convert use case

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::recording::{ChunkBuffer, Duration};
use crate::domain::upload::{
    StatusMessage, UploadInFlight, UploadState, UploadStatus, CONVERTED_FILE_NAME,
    FAILURE_MESSAGE, SUCCESS_MESSAGE,
};

use super::ports::{
    ArtifactSaver, ConversionService, NotificationIcon, Notifier, SaveError, UploadError,
};

/// Errors from a submission
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Nothing recorded yet")]
    EmptyRecording,

    #[error("{0}")]
    AlreadyInFlight(#[from] UploadInFlight),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Could not save the converted file: {0}")]
    Save(#[from] SaveError),
}

/// Settings for the orchestrator
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Name the converted artifact is saved under
    pub artifact_file_name: String,
    /// How long a success or failure message stays visible
    pub message_duration: Duration,
    /// Whether to show desktop notifications
    pub enable_notify: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            artifact_file_name: CONVERTED_FILE_NAME.to_string(),
            message_duration: Duration::default_message_duration(),
            enable_notify: false,
        }
    }
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub struct SubmitOutput {
    /// Where the converted file was written
    pub path: PathBuf,
    /// Converted file size in human-readable format
    pub size: String,
}

/// Sends a finished recording to the conversion service and saves the result.
///
/// At most one submission is in flight at a time. Finished submissions leave a
/// status message that reverts to idle after `message_duration`.
pub struct UploadOrchestrator<C, S, N>
where
    C: ConversionService,
    S: ArtifactSaver,
    N: Notifier,
{
    converter: C,
    saver: S,
    notifier: N,
    config: UploadConfig,
    status: Arc<StdMutex<UploadStatus>>,
}

impl<C, S, N> UploadOrchestrator<C, S, N>
where
    C: ConversionService,
    S: ArtifactSaver,
    N: Notifier,
{
    pub fn new(converter: C, saver: S, notifier: N, config: UploadConfig) -> Self {
        Self {
            converter,
            saver,
            notifier,
            config,
            status: Arc::new(StdMutex::new(UploadStatus::new())),
        }
    }

    pub fn state(&self) -> UploadState {
        self.lock_status().state()
    }

    /// True while a request is in flight
    pub fn is_loading(&self) -> bool {
        self.lock_status().is_in_flight()
    }

    /// Message left by the last finished submission, until it expires
    pub fn status_message(&self) -> Option<StatusMessage> {
        self.lock_status().message().cloned()
    }

    /// Upload `recording` for conversion and save the returned file.
    ///
    /// The recording itself is never modified; the caller decides what to do
    /// with it based on the result.
    pub async fn submit(&self, recording: &ChunkBuffer) -> Result<SubmitOutput, SubmitError> {
        if recording.is_empty() {
            return Err(SubmitError::EmptyRecording);
        }

        let generation = self.lock_status().begin()?;
        let _in_flight = InFlightGuard {
            status: Arc::clone(&self.status),
            generation,
        };
        self.notify("Converting recording...", NotificationIcon::Uploading)
            .await;

        let result = self.exchange(recording).await;

        self.lock_status().complete(generation, result.is_ok());
        self.schedule_expiry(generation);

        match &result {
            Ok(output) => {
                info!(
                    path = %output.path.display(),
                    size = %output.size,
                    "converted file saved"
                );
                self.notify(SUCCESS_MESSAGE, NotificationIcon::Success)
                    .await;
            }
            Err(e) => {
                warn!(error = %e, "submission failed");
                self.notify(FAILURE_MESSAGE, NotificationIcon::Error)
                    .await;
            }
        }

        result
    }

    async fn exchange(&self, recording: &ChunkBuffer) -> Result<SubmitOutput, SubmitError> {
        let payload = recording.to_payload();
        debug!(
            chunks = recording.len(),
            bytes = payload.size_bytes(),
            "uploading recording"
        );

        let artifact = self.converter.convert(&payload).await?;
        let path = self
            .saver
            .save(&artifact, &self.config.artifact_file_name)
            .await?;

        Ok(SubmitOutput {
            path,
            size: artifact.human_readable_size(),
        })
    }

    fn schedule_expiry(&self, generation: u64) {
        let status = Arc::clone(&self.status);
        let delay = self.config.message_duration.as_std();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut status = status.lock().unwrap_or_else(|e| e.into_inner());
            if status.expire(generation) {
                debug!(generation, "status message expired");
            }
        });
    }

    async fn notify(&self, message: &str, icon: NotificationIcon) {
        if !self.config.enable_notify {
            return;
        }
        if let Err(e) = self.notifier.notify("Screencast", message, icon).await {
            debug!(error = %e, "notification failed");
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, UploadStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears IN_FLIGHT if a submission future is dropped before completing
struct InFlightGuard {
    status: Arc<StdMutex<UploadStatus>>,
    generation: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if status.abandon(self.generation) {
            warn!(generation = self.generation, "submission cancelled");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::ports::{NotificationError, SilentNotifier};
    use crate::domain::media::{ContainerFormat, MediaData};
    use crate::domain::recording::Chunk;
    use crate::domain::upload::StatusKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Conversion double with a scripted answer and an optional gate
    #[derive(Clone)]
    pub(crate) struct MockConverter {
        outcome: Result<Vec<u8>, UploadError>,
        calls: Arc<AtomicUsize>,
        received: Arc<StdMutex<Vec<usize>>>,
        gate: Option<Arc<Notify>>,
    }

    impl MockConverter {
        pub(crate) fn ok(body: &[u8]) -> Self {
            Self {
                outcome: Ok(body.to_vec()),
                calls: Arc::new(AtomicUsize::new(0)),
                received: Arc::new(StdMutex::new(Vec::new())),
                gate: None,
            }
        }

        pub(crate) fn failing(error: UploadError) -> Self {
            Self {
                outcome: Err(error),
                ..Self::ok(b"")
            }
        }

        pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Payload sizes seen by the service
        pub(crate) fn received(&self) -> Vec<usize> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConversionService for MockConverter {
        async fn convert(&self, payload: &MediaData) -> Result<MediaData, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.received.lock().unwrap().push(payload.size_bytes());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.outcome
                .clone()
                .map(|body| MediaData::new(body, ContainerFormat::Mp4))
        }
    }

    /// Saver double that records (file name, size) pairs
    #[derive(Clone, Default)]
    pub(crate) struct MockSaver {
        saved: Arc<StdMutex<Vec<(String, usize)>>>,
        fail: bool,
    }

    impl MockSaver {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub(crate) fn saved(&self) -> Vec<(String, usize)> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArtifactSaver for MockSaver {
        async fn save(&self, artifact: &MediaData, file_name: &str) -> Result<PathBuf, SaveError> {
            if self.fail {
                return Err(SaveError::WriteFailed("disk full".to_string()));
            }
            self.saved
                .lock()
                .unwrap()
                .push((file_name.to_string(), artifact.size_bytes()));
            Ok(PathBuf::from("/downloads").join(file_name))
        }
    }

    struct CountingNotifier(Arc<AtomicUsize>);

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(
            &self,
            _title: &str,
            _message: &str,
            _icon: NotificationIcon,
        ) -> Result<(), NotificationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn recording(sizes: &[usize]) -> ChunkBuffer {
        let mut buffer = ChunkBuffer::new();
        for &n in sizes {
            buffer.push(Chunk::from(vec![1u8; n]));
        }
        buffer
    }

    fn orchestrator(
        converter: MockConverter,
        saver: MockSaver,
    ) -> UploadOrchestrator<MockConverter, MockSaver, SilentNotifier> {
        UploadOrchestrator::new(converter, saver, SilentNotifier, UploadConfig::default())
    }

    #[tokio::test]
    async fn successful_submission_saves_artifact() {
        let converter = MockConverter::ok(&[9u8; 4096]);
        let saver = MockSaver::default();
        let orchestrator = orchestrator(converter.clone(), saver.clone());

        let output = orchestrator.submit(&recording(&[10, 20, 30])).await.unwrap();

        assert_eq!(output.path, PathBuf::from("/downloads/converted-video.mp4"));
        assert_eq!(converter.received(), vec![60]);
        assert_eq!(saver.saved(), vec![("converted-video.mp4".to_string(), 4096)]);
        assert_eq!(orchestrator.state(), UploadState::Succeeded);
        assert_eq!(orchestrator.status_message().unwrap().text, SUCCESS_MESSAGE);
    }

    #[tokio::test]
    async fn rejected_submission_reports_failure() {
        let saver = MockSaver::default();
        let orchestrator = orchestrator(
            MockConverter::failing(UploadError::Rejected {
                status: 500,
                message: "conversion crashed".to_string(),
            }),
            saver.clone(),
        );

        let err = orchestrator.submit(&recording(&[5])).await.unwrap_err();

        assert!(matches!(err, SubmitError::Upload(UploadError::Rejected { status: 500, .. })));
        assert_eq!(orchestrator.state(), UploadState::Failed);
        let message = orchestrator.status_message().unwrap();
        assert_eq!(message.kind, StatusKind::Failure);
        assert_eq!(message.text, FAILURE_MESSAGE);
        assert!(saver.saved().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_reports_failure() {
        let orchestrator = orchestrator(
            MockConverter::failing(UploadError::Transport("connection refused".to_string())),
            MockSaver::default(),
        );

        let err = orchestrator.submit(&recording(&[5])).await.unwrap_err();
        assert!(matches!(err, SubmitError::Upload(ref e) if e.is_transport()));
        assert_eq!(orchestrator.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn save_failure_reports_failure() {
        let orchestrator = orchestrator(MockConverter::ok(b"mp4"), MockSaver::failing());

        let err = orchestrator.submit(&recording(&[5])).await.unwrap_err();
        assert!(matches!(err, SubmitError::Save(_)));
        assert_eq!(orchestrator.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn empty_recording_is_rejected_without_request() {
        let converter = MockConverter::ok(b"mp4");
        let orchestrator = orchestrator(converter.clone(), MockSaver::default());

        let err = orchestrator.submit(&ChunkBuffer::new()).await.unwrap_err();

        assert!(matches!(err, SubmitError::EmptyRecording));
        assert_eq!(converter.calls(), 0);
        assert_eq!(orchestrator.state(), UploadState::Idle);
    }

    #[tokio::test]
    async fn second_submission_while_in_flight_is_rejected() {
        let gate = Arc::new(Notify::new());
        let converter = MockConverter::ok(b"mp4").gated(Arc::clone(&gate));
        let orchestrator = orchestrator(converter.clone(), MockSaver::default());
        let buffer = recording(&[7]);

        let first = orchestrator.submit(&buffer);
        let second = async {
            tokio::task::yield_now().await;
            assert!(orchestrator.is_loading());
            let result = orchestrator.submit(&buffer).await;
            gate.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(SubmitError::AlreadyInFlight(_))));
        assert_eq!(converter.calls(), 1);
    }

    #[tokio::test]
    async fn recording_is_not_modified() {
        let orchestrator = orchestrator(
            MockConverter::failing(UploadError::MalformedBody("empty body".to_string())),
            MockSaver::default(),
        );
        let buffer = recording(&[3, 4]);

        let _ = orchestrator.submit(&buffer).await;
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.total_bytes(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn message_expires_after_duration() {
        let orchestrator = orchestrator(MockConverter::ok(b"mp4"), MockSaver::default());
        orchestrator.submit(&recording(&[1])).await.unwrap();
        assert_eq!(orchestrator.state(), UploadState::Succeeded);

        tokio::time::sleep(std::time::Duration::from_millis(2400)).await;
        assert!(orchestrator.status_message().is_some());

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert_eq!(orchestrator.state(), UploadState::Idle);
        assert!(orchestrator.status_message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn older_timer_does_not_clear_newer_message() {
        let orchestrator = orchestrator(MockConverter::ok(b"mp4"), MockSaver::default());
        let buffer = recording(&[1]);

        orchestrator.submit(&buffer).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2000)).await;
        orchestrator.submit(&buffer).await.unwrap();

        // First timer fires here; the second submission's message stays
        tokio::time::sleep(std::time::Duration::from_millis(1000)).await;
        assert_eq!(orchestrator.state(), UploadState::Succeeded);

        tokio::time::sleep(std::time::Duration::from_millis(2000)).await;
        assert_eq!(orchestrator.state(), UploadState::Idle);
    }

    #[tokio::test]
    async fn notifications_only_when_enabled() {
        let count = Arc::new(AtomicUsize::new(0));
        let config = UploadConfig {
            enable_notify: true,
            ..Default::default()
        };
        let orchestrator = UploadOrchestrator::new(
            MockConverter::ok(b"mp4"),
            MockSaver::default(),
            CountingNotifier(Arc::clone(&count)),
            config,
        );

        orchestrator.submit(&recording(&[1])).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_submission_does_not_stay_in_flight() {
        let gate = Arc::new(Notify::new());
        let converter = MockConverter::ok(b"mp4").gated(Arc::clone(&gate));
        let orchestrator = orchestrator(converter.clone(), MockSaver::default());
        let recording = recording(&[8]);

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            orchestrator.submit(&recording),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(converter.calls(), 1);

        assert_eq!(orchestrator.state(), UploadState::Idle);
        assert!(!orchestrator.is_loading());
        assert!(orchestrator.status_message().is_none());

        gate.notify_one();
        orchestrator.submit(&recording).await.unwrap();
        assert_eq!(orchestrator.state(), UploadState::Succeeded);
    }
}
