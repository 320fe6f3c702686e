//! Message types for the relay actor.
//!
//! Request/reply uses `tokio::sync::oneshot`. Every message carries a
//! `respond_to` so callers can tell a processed request from a dead actor.

use crate::protocol::{ClientEvent, ServerEvent};
use crate::relay::RelayOutcome;
use chrono::{DateTime, Utc};
use common::types::{ConnectionId, ParticipantId, SessionId};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Messages sent to `RelayActor`.
#[derive(Debug)]
pub enum RelayMessage {
    /// Register the outbound channel of a freshly accepted socket.
    Connect {
        connection_id: ConnectionId,
        outbound: mpsc::Sender<ServerEvent>,
        respond_to: oneshot::Sender<()>,
    },

    /// A parsed client frame.
    Event {
        connection_id: ConnectionId,
        event: ClientEvent,
        respond_to: oneshot::Sender<RelayOutcome>,
    },

    /// The socket closed. Also drops the outbound channel.
    Disconnect {
        connection_id: ConnectionId,
        respond_to: oneshot::Sender<RelayOutcome>,
    },

    /// Reaper sweep.
    ReapStale {
        now: DateTime<Utc>,
        max_age: Duration,
        /// Ids of removed sessions.
        respond_to: oneshot::Sender<Vec<SessionId>>,
    },

    GetStatus {
        respond_to: oneshot::Sender<RelayStatus>,
    },

    GetSession {
        session_id: SessionId,
        respond_to: oneshot::Sender<Option<SessionInfo>>,
    },
}

/// Snapshot of relay state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStatus {
    pub sessions: usize,
    pub participants: usize,
    pub connections: usize,
    /// Reaper sweeps processed since start.
    pub sweeps: u64,
    /// Sessions removed by the reaper since start.
    pub sessions_reaped: u64,
}

/// Snapshot of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    /// Sorted for stable comparisons.
    pub participant_ids: Vec<ParticipantId>,
    pub created_at: DateTime<Utc>,
}
