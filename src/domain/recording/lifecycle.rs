//! Recording lifecycle state machine

use std::fmt;
use thiserror::Error;

/// Recording states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Requesting,
    Recording,
    Stopped,
}

impl RecordingState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: RecordingState,
    pub action: String,
}

/// Recording lifecycle entity.
///
/// State machine:
///   IDLE | STOPPED -> REQUESTING (begin_request)
///   REQUESTING -> RECORDING (grant)
///   REQUESTING -> IDLE (deny)
///   RECORDING -> STOPPED (stop)
#[derive(Debug, Default)]
pub struct RecordingLifecycle {
    state: RecordingState,
}

impl RecordingLifecycle {
    /// Create a new lifecycle in idle state
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RecordingState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn is_stopped(&self) -> bool {
        self.state == RecordingState::Stopped
    }

    /// Requesting or recording: the capture devices are (being) claimed
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            RecordingState::Requesting | RecordingState::Recording
        )
    }

    /// Transition from IDLE or STOPPED to REQUESTING
    pub fn begin_request(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecordingState::Idle, RecordingState::Stopped],
            RecordingState::Requesting,
            "start recording",
        )
    }

    /// Transition from REQUESTING to RECORDING
    pub fn grant(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecordingState::Requesting],
            RecordingState::Recording,
            "begin recording",
        )
    }

    /// Transition from REQUESTING back to IDLE
    pub fn deny(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecordingState::Requesting],
            RecordingState::Idle,
            "abandon the request",
        )
    }

    /// Transition from RECORDING to STOPPED
    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[RecordingState::Recording],
            RecordingState::Stopped,
            "stop recording",
        )
    }

    fn transition(
        &mut self,
        from: &[RecordingState],
        to: RecordingState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if !from.contains(&self.state) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}
