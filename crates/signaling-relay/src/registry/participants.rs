//! Connection -> participant bookkeeping.

use common::types::{ConnectionId, ParticipantId, SessionId};
use std::collections::HashMap;

/// Identity of one joined participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub session_id: SessionId,
    pub connection_id: ConnectionId,
}

/// Live connections that have joined a session, keyed by connection.
///
/// No uniqueness is enforced on `participant_id`; that arbitration happens
/// in the session registry.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    by_connection: HashMap<ConnectionId, ParticipantInfo>,
}

impl ParticipantRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `connection_id`, returning the
    /// previous one.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        participant_id: ParticipantId,
        display_name: String,
        session_id: SessionId,
    ) -> Option<ParticipantInfo> {
        self.by_connection.insert(
            connection_id,
            ParticipantInfo {
                participant_id,
                display_name,
                session_id,
                connection_id,
            },
        )
    }

    #[must_use]
    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<&ParticipantInfo> {
        self.by_connection.get(connection_id)
    }

    /// Idempotent.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ParticipantInfo> {
        self.by_connection.remove(connection_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_connection.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_connection.is_empty()
    }
}
