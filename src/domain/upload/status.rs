//! Upload state machine and transient status messages

use std::fmt;
use thiserror::Error;

/// Message shown after the converted file was saved
pub const SUCCESS_MESSAGE: &str = "File ready for download!";

/// Message shown after any failed exchange
pub const FAILURE_MESSAGE: &str = "Failed to upload the file";

/// Upload states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl UploadState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InFlight => "in-flight",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Failure,
}

/// A transient message for the display layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success() -> Self {
        Self {
            kind: StatusKind::Success,
            text: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure() -> Self {
        Self {
            kind: StatusKind::Failure,
            text: FAILURE_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returned when a submission is attempted while another one is in flight
#[derive(Debug, Clone, Copy, Error)]
#[error("An upload is already in progress")]
pub struct UploadInFlight;

/// Upload status entity.
///
/// Every submission gets a generation number; the delayed revert of a
/// finished submission only applies while no newer submission has begun.
///
/// State machine:
///   IDLE | SUCCEEDED | FAILED -> IN_FLIGHT (begin)
///   IN_FLIGHT -> SUCCEEDED | FAILED (complete)
///   SUCCEEDED | FAILED -> IDLE (expire, same generation only)
///   IN_FLIGHT -> IDLE (abandon, same generation only)
#[derive(Debug, Default)]
pub struct UploadStatus {
    state: UploadState,
    message: Option<StatusMessage>,
    generation: u64,
}

impl UploadStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state == UploadState::InFlight
    }

    /// Enter IN_FLIGHT, clearing any leftover message.
    ///
    /// Returns the generation of the new submission.
    pub fn begin(&mut self) -> Result<u64, UploadInFlight> {
        if self.is_in_flight() {
            return Err(UploadInFlight);
        }
        self.generation += 1;
        self.state = UploadState::InFlight;
        self.message = None;
        Ok(self.generation)
    }

    /// Record the outcome of the submission `generation`
    pub fn complete(&mut self, generation: u64, succeeded: bool) {
        if generation != self.generation || !self.is_in_flight() {
            return;
        }
        if succeeded {
            self.state = UploadState::Succeeded;
            self.message = Some(StatusMessage::success());
        } else {
            self.state = UploadState::Failed;
            self.message = Some(StatusMessage::failure());
        }
    }

    /// Revert a finished submission to IDLE.
    ///
    /// Returns false when a newer submission has started since.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        if !matches!(self.state, UploadState::Succeeded | UploadState::Failed) {
            return false;
        }
        self.state = UploadState::Idle;
        self.message = None;
        true
    }

    /// Drop the submission `generation` without an outcome, e.g. when its
    /// future is cancelled. No-op once the submission has completed.
    pub fn abandon(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.is_in_flight() {
            return false;
        }
        self.state = UploadState::Idle;
        true
    }
}
