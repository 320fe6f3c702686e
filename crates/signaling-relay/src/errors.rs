//! Signaling relay error types.
//!
//! Lookup misses inside the relay are not errors: they are reported as a
//! [`DropReason`] and never reach the client. Only boundary failures (bad
//! frames, a dead actor) are represented as errors.

use thiserror::Error;

/// Relay service error type.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Actor mailbox or reply channel closed.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a relay operation produced no delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DropReason {
    /// The connection never joined, or already left.
    #[error("unknown participant")]
    UnknownParticipant,

    #[error("unknown session")]
    UnknownSession,

    /// The addressed participant is not a member of the session.
    #[error("unknown target")]
    UnknownTarget,
}

impl DropReason {
    /// Bounded label for metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::UnknownParticipant => "unknown_participant",
            DropReason::UnknownSession => "unknown_session",
            DropReason::UnknownTarget => "unknown_target",
        }
    }
}

/// A client frame that could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Message is not valid JSON")]
    InvalidJson,

    #[error("Message has no type")]
    MissingType,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// Recognized type, but fields are missing or have the wrong shape.
    #[error("Invalid {event_type} message: {detail}")]
    InvalidEvent { event_type: String, detail: String },

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),
}

impl ProtocolError {
    /// Machine-readable code sent in `error` events.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::InvalidJson => "INVALID_JSON",
            ProtocolError::MissingType | ProtocolError::UnknownType(_) => "UNKNOWN_EVENT",
            ProtocolError::InvalidEvent { .. } | ProtocolError::EmptyField(_) => "INVALID_EVENT",
        }
    }
}
