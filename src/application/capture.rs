//! Capture session use case
//!
//! Owns the two capture grants, the live recording engine and the chunk
//! buffer of the current recording.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::media::{CombinedStream, MediaSource, SourceKind};
use crate::domain::recording::{
    Chunk, ChunkBuffer, InvalidStateTransition, RecordingLifecycle, RecordingState,
};

use super::ports::{CaptureGrant, EngineHandle, GrantError, RecordingEngine, RecordingError};

/// Chunks the engine may queue ahead of the collector
pub const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// Errors from the capture session
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Could not acquire {kind} source: {reason}")]
    SourceAcquisition { kind: SourceKind, reason: GrantError },

    #[error("Recording engine failed: {0}")]
    Engine(#[from] RecordingError),

    #[error("{0}")]
    InvalidState(#[from] InvalidStateTransition),
}

impl CaptureError {
    pub fn is_source_acquisition(&self) -> bool {
        matches!(self, Self::SourceAcquisition { .. })
    }
}

/// Both grants plus the stream composed from them.
/// Dropping this releases both sources.
#[derive(Debug)]
pub struct GrantedSources {
    display: MediaSource,
    microphone: MediaSource,
    stream: CombinedStream,
}

impl GrantedSources {
    pub fn stream(&self) -> &CombinedStream {
        &self.stream
    }

    pub fn display(&self) -> &MediaSource {
        &self.display
    }

    pub fn microphone(&self) -> &MediaSource {
        &self.microphone
    }

    /// Stop every track of both sources
    pub fn release(&self) {
        self.display.release();
        self.microphone.release();
    }
}

struct ActiveRecording {
    sources: GrantedSources,
    handle: Box<dyn EngineHandle>,
    collector: JoinHandle<()>,
}

/// Capture session: one recording at a time, chunks accumulated in order.
pub struct CaptureSession<D, M, E>
where
    D: CaptureGrant,
    M: CaptureGrant,
    E: RecordingEngine,
{
    display: D,
    microphone: M,
    engine: E,
    lifecycle: RecordingLifecycle,
    chunks: Arc<StdMutex<ChunkBuffer>>,
    active: Option<ActiveRecording>,
    channel_capacity: usize,
}

impl<D, M, E> CaptureSession<D, M, E>
where
    D: CaptureGrant,
    M: CaptureGrant,
    E: RecordingEngine,
{
    /// Create an idle session with an empty buffer
    pub fn new(display: D, microphone: M, engine: E) -> Self {
        Self {
            display,
            microphone,
            engine,
            lifecycle: RecordingLifecycle::new(),
            chunks: Arc::new(StdMutex::new(ChunkBuffer::new())),
            active: None,
            channel_capacity: CHUNK_CHANNEL_CAPACITY,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.lifecycle.state()
    }

    pub fn is_recording(&self) -> bool {
        self.lifecycle.is_recording()
    }

    /// Requesting or recording
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn chunk_count(&self) -> usize {
        self.lock_chunks().len()
    }

    pub fn total_bytes(&self) -> usize {
        self.lock_chunks().total_bytes()
    }

    /// Read-only copy of the buffer. Chunk bytes are shared, not copied.
    pub fn snapshot(&self) -> ChunkBuffer {
        self.lock_chunks().clone()
    }

    /// Acquire the display and microphone grants concurrently.
    ///
    /// Both must succeed. If either fails, the other one is released before
    /// the error is returned, so no device stays open.
    pub async fn request_sources(&self) -> Result<GrantedSources, CaptureError> {
        let (display, microphone) =
            tokio::join!(self.display.acquire(), self.microphone.acquire());

        let (display, microphone) = match (display, microphone) {
            (Ok(display), Ok(microphone)) => (display, microphone),
            (Ok(display), Err(reason)) => {
                display.release();
                return Err(CaptureError::SourceAcquisition {
                    kind: SourceKind::Microphone,
                    reason,
                });
            }
            (Err(reason), Ok(microphone)) => {
                microphone.release();
                return Err(CaptureError::SourceAcquisition {
                    kind: SourceKind::Display,
                    reason,
                });
            }
            (Err(reason), Err(_)) => {
                return Err(CaptureError::SourceAcquisition {
                    kind: SourceKind::Display,
                    reason,
                });
            }
        };

        let stream = CombinedStream::compose(&display, &microphone);
        let missing = if !stream.has_video() {
            Some((SourceKind::Display, "no video track granted"))
        } else if !stream.has_audio() {
            Some((SourceKind::Microphone, "no audio track granted"))
        } else {
            None
        };

        if let Some((kind, message)) = missing {
            display.release();
            microphone.release();
            return Err(CaptureError::SourceAcquisition {
                kind,
                reason: GrantError::Unavailable(message.to_string()),
            });
        }

        debug!(
            video = stream.video_tracks().count(),
            audio = stream.audio_tracks().count(),
            "sources granted"
        );

        Ok(GrantedSources {
            display,
            microphone,
            stream,
        })
    }

    /// Start a new recording.
    ///
    /// Valid from idle, or from stopped to record again. The previous
    /// recording's chunks are discarded only once the new grants and the
    /// engine are up; on failure the session returns to idle with the
    /// buffer untouched.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        self.lifecycle.begin_request()?;

        let sources = match self.request_sources().await {
            Ok(sources) => sources,
            Err(e) => return Err(self.abandon_request(e)),
        };

        // The engine may deliver while starting, so the collector runs first.
        // It fills a fresh buffer that replaces the old one once start succeeds.
        let (sink, receiver) = mpsc::channel(self.channel_capacity);
        let fresh = Arc::new(StdMutex::new(ChunkBuffer::new()));
        let collector = tokio::spawn(collect_chunks(receiver, Arc::clone(&fresh)));

        let handle = match self.engine.start(sources.stream(), sink).await {
            Ok(handle) => handle,
            Err(e) => {
                collector.abort();
                sources.release();
                return Err(self.abandon_request(e.into()));
            }
        };

        self.chunks = fresh;
        self.active = Some(ActiveRecording {
            sources,
            handle,
            collector,
        });
        self.lifecycle.grant()?;
        info!("recording started");

        Ok(())
    }

    /// Stop the current recording.
    ///
    /// The engine is finalized first and every chunk it flushed is collected
    /// before the sources are released. Calling this while not recording
    /// does nothing.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.lifecycle.is_recording() {
            debug!(state = %self.lifecycle.state(), "stop ignored");
            return Ok(());
        }

        let finalized = match self.active.take() {
            Some(ActiveRecording {
                sources,
                handle,
                collector,
            }) => {
                let finalized = handle.finalize().await;
                if let Err(e) = collector.await {
                    warn!(error = %e, "chunk collector ended abnormally");
                }
                sources.release();
                finalized
            }
            None => Ok(()),
        };

        self.lifecycle.stop()?;

        {
            let chunks = self.lock_chunks();
            info!(
                chunks = chunks.len(),
                bytes = chunks.total_bytes(),
                "recording stopped"
            );
        }

        finalized.map_err(|e| {
            warn!(error = %e, "recording engine reported an error while finalizing");
            CaptureError::from(e)
        })
    }

    /// True once the engine has closed its sink while the session still
    /// believes it is recording, i.e. the encoder ended on its own.
    pub fn engine_ended(&self) -> bool {
        self.lifecycle.is_recording()
            && self
                .active
                .as_ref()
                .is_some_and(|active| active.collector.is_finished())
    }

    /// Discard the recorded chunks. Refused while a recording is live.
    pub fn reset(&mut self) -> Result<(), CaptureError> {
        if self.lifecycle.is_active() {
            return Err(InvalidStateTransition {
                current_state: self.lifecycle.state(),
                action: "discard the recording".to_string(),
            }
            .into());
        }
        self.lock_chunks().clear();
        Ok(())
    }

    /// Stop any live recording. Called on teardown.
    pub async fn shutdown(&mut self) -> Result<(), CaptureError> {
        self.stop().await
    }

    fn abandon_request(&mut self, error: CaptureError) -> CaptureError {
        // Only reachable from REQUESTING
        let _ = self.lifecycle.deny();
        warn!(error = %error, "recording could not start");
        error
    }

    fn lock_chunks(&self) -> MutexGuard<'_, ChunkBuffer> {
        self.chunks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<D, M, E> Drop for CaptureSession<D, M, E>
where
    D: CaptureGrant,
    M: CaptureGrant,
    E: RecordingEngine,
{
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            warn!("capture session dropped while recording; releasing devices");
            active.collector.abort();
            active.sources.release();
        }
    }
}

/// Drain the chunk channel into the buffer until the engine closes it
async fn collect_chunks(mut receiver: mpsc::Receiver<Chunk>, buffer: Arc<StdMutex<ChunkBuffer>>) {
    while let Some(chunk) = receiver.recv().await {
        let mut buffer = buffer.lock().unwrap_or_else(|e| e.into_inner());
        if !buffer.push(chunk) {
            debug!("discarded empty chunk");
        }
    }
    debug!("chunk channel closed");
}
