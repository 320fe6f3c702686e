//! Wire protocol for the signaling WebSocket.
//!
//! Every frame is a JSON text message, internally tagged by `type` with
//! camelCase fields. Negotiation payloads (`offer`, `answer`, `candidate`)
//! are opaque JSON and pass through the relay untouched.

use crate::errors::ProtocolError;
use common::types::{ParticipantId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    #[serde(alias = "join")]
    JoinSession {
        session_id: SessionId,
        participant_id: ParticipantId,
        participant_name: String,
    },
    Offer {
        session_id: SessionId,
        target_id: ParticipantId,
        offer: Value,
    },
    Answer {
        session_id: SessionId,
        target_id: ParticipantId,
        answer: Value,
    },
    IceCandidate {
        session_id: SessionId,
        target_id: ParticipantId,
        candidate: Value,
    },
    EndSession {
        session_id: SessionId,
    },
}

impl ClientEvent {
    /// Wire name, used as a bounded metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::JoinSession { .. } => "join-session",
            ClientEvent::Offer { .. } => "offer",
            ClientEvent::Answer { .. } => "answer",
            ClientEvent::IceCandidate { .. } => "ice-candidate",
            ClientEvent::EndSession { .. } => "end-session",
        }
    }

    /// Reject empty identifiers. Serde already guarantees presence.
    fn check_required(&self) -> Result<(), ProtocolError> {
        let (session_id, second) = match self {
            ClientEvent::JoinSession {
                session_id,
                participant_id,
                ..
            } => (session_id, Some(("participantId", participant_id))),
            ClientEvent::Offer {
                session_id,
                target_id,
                ..
            }
            | ClientEvent::Answer {
                session_id,
                target_id,
                ..
            }
            | ClientEvent::IceCandidate {
                session_id,
                target_id,
                ..
            } => (session_id, Some(("targetId", target_id))),
            ClientEvent::EndSession { session_id } => (session_id, None),
        };

        if session_id.as_str().is_empty() {
            return Err(ProtocolError::EmptyField("sessionId"));
        }

        match second {
            Some((field, id)) if id.as_str().is_empty() => Err(ProtocolError::EmptyField(field)),
            _ => Ok(()),
        }
    }
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    SessionJoined {
        session_id: SessionId,
        participant_id: ParticipantId,
        participant_count: usize,
    },
    PartnerConnected {
        partner_id: ParticipantId,
        partner_name: String,
    },
    PartnerDisconnected {
        partner_id: ParticipantId,
        partner_name: String,
    },
    Offer {
        from_id: ParticipantId,
        from_name: String,
        offer: Value,
    },
    Answer {
        from_id: ParticipantId,
        from_name: String,
        answer: Value,
    },
    IceCandidate {
        from_id: ParticipantId,
        candidate: Value,
    },
    Error {
        code: String,
        message: String,
    },
}

impl From<&ProtocolError> for ServerEvent {
    fn from(err: &ProtocolError) -> Self {
        ServerEvent::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

const KNOWN_TYPES: &[&str] = &[
    "join-session",
    "join",
    "offer",
    "answer",
    "ice-candidate",
    "end-session",
];

/// Parse one text frame into a [`ClientEvent`].
///
/// Goes through `Value` first so that an unknown `type` is reported
/// separately from a known type with bad fields.
pub fn parse_client_event(text: &str) -> Result<ClientEvent, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::InvalidJson)?;

    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();

    if !KNOWN_TYPES.contains(&event_type.as_str()) {
        return Err(ProtocolError::UnknownType(event_type));
    }

    let event: ClientEvent =
        serde_json::from_value(value).map_err(|e| ProtocolError::InvalidEvent {
            event_type,
            detail: e.to_string(),
        })?;

    event.check_required()?;
    Ok(event)
}
