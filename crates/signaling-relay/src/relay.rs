//! `SignalingRelay` - the event-driven core that pairs peers and routes
//! negotiation messages.
//!
//! The relay is synchronous and owns both registries. Everything it sends
//! goes through an [`Outbound`] sink, so the same core drives the live
//! WebSocket hub and the in-memory recorder used in tests.
//!
//! # Session lifecycle
//!
//! `EMPTY -> WAITING (1 member) -> PAIRED (2 members) -> EMPTY`. Pairing is
//! announced only on the transition to exactly two members; a third joiner
//! is admitted and acknowledged but gets no `partner-connected`.
//!
//! # Consistency
//!
//! The participant registry and the session member maps are updated
//! together in every operation:
//! - a connection joining a different session, or under a different id, is
//!   first detached from its previous session;
//! - a join that displaces a member bound to another connection drops that
//!   connection's participant entry;
//! - disconnect only removes a member still bound to the disconnecting
//!   connection.

use crate::errors::DropReason;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::{ParticipantInfo, ParticipantRegistry, SessionRegistry};
use chrono::{DateTime, Utc};
use common::types::{ConnectionId, ParticipantId, SessionId};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Where the relay sends server events.
///
/// Delivery is fire-and-forget; implementations must not block.
pub trait Outbound {
    fn deliver(&mut self, connection_id: ConnectionId, event: ServerEvent);
}

/// Result of one relay operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    Dropped(DropReason),
}

impl RelayOutcome {
    /// Bounded label for metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RelayOutcome::Delivered => "delivered",
            RelayOutcome::Dropped(reason) => reason.as_str(),
        }
    }
}

/// The three forwarded negotiation message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    fn into_event(self, sender: &ParticipantInfo, payload: Value) -> ServerEvent {
        let from_id = sender.participant_id.clone();
        match self {
            SignalKind::Offer => ServerEvent::Offer {
                from_id,
                from_name: sender.display_name.clone(),
                offer: payload,
            },
            SignalKind::Answer => ServerEvent::Answer {
                from_id,
                from_name: sender.display_name.clone(),
                answer: payload,
            },
            SignalKind::IceCandidate => ServerEvent::IceCandidate {
                from_id,
                candidate: payload,
            },
        }
    }
}

pub struct SignalingRelay<O> {
    participants: ParticipantRegistry,
    sessions: SessionRegistry,
    outbound: O,
}

impl<O: Outbound> SignalingRelay<O> {
    pub fn new(outbound: O) -> Self {
        Self {
            participants: ParticipantRegistry::new(),
            sessions: SessionRegistry::new(),
            outbound,
        }
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn outbound(&self) -> &O {
        &self.outbound
    }

    pub fn outbound_mut(&mut self) -> &mut O {
        &mut self.outbound
    }

    /// Route one parsed client event.
    pub fn handle_event(
        &mut self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> RelayOutcome {
        match event {
            ClientEvent::JoinSession {
                session_id,
                participant_id,
                participant_name,
            } => self.join(connection_id, session_id, participant_id, participant_name),
            ClientEvent::Offer {
                session_id,
                target_id,
                offer,
            } => self.signal(connection_id, SignalKind::Offer, &session_id, &target_id, offer),
            ClientEvent::Answer {
                session_id,
                target_id,
                answer,
            } => self.signal(connection_id, SignalKind::Answer, &session_id, &target_id, answer),
            ClientEvent::IceCandidate {
                session_id,
                target_id,
                candidate,
            } => self.signal(
                connection_id,
                SignalKind::IceCandidate,
                &session_id,
                &target_id,
                candidate,
            ),
            ClientEvent::EndSession { session_id } => self.end_session(connection_id, &session_id),
        }
    }

    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        session_id: SessionId,
        participant_id: ParticipantId,
        display_name: String,
    ) -> RelayOutcome {
        self.join_at(connection_id, session_id, participant_id, display_name, Utc::now())
    }

    /// [`join`](Self::join) with an explicit creation time for new sessions.
    pub fn join_at(
        &mut self,
        connection_id: ConnectionId,
        session_id: SessionId,
        participant_id: ParticipantId,
        display_name: String,
        now: DateTime<Utc>,
    ) -> RelayOutcome {
        let moving = self.participants.lookup(&connection_id).is_some_and(|current| {
            current.session_id != session_id || current.participant_id != participant_id
        });
        if moving {
            debug!(
                target: "relay.core",
                connection_id = %connection_id,
                "Connection joining again, leaving previous session first"
            );
            self.detach(connection_id, true);
        }

        let info = ParticipantInfo {
            participant_id: participant_id.clone(),
            display_name: display_name.clone(),
            session_id: session_id.clone(),
            connection_id,
        };

        let displaced = self
            .sessions
            .add_participant(&session_id, participant_id.clone(), info, now);
        let participant_count = self
            .sessions
            .get(&session_id)
            .map_or(0, |session| session.participant_count());

        if let Some(previous) = displaced.filter(|p| p.connection_id != connection_id) {
            // Last writer wins; the old connection no longer belongs anywhere
            self.participants.remove(&previous.connection_id);
            debug!(
                target: "relay.core",
                session_id = %session_id,
                displaced_connection = %previous.connection_id,
                "Participant id re-bound to a new connection"
            );
        }

        self.participants.register(
            connection_id,
            participant_id.clone(),
            display_name.clone(),
            session_id.clone(),
        );

        debug!(
            target: "relay.core",
            session_id = %session_id,
            participant_count,
            "Participant joined session"
        );

        self.outbound.deliver(
            connection_id,
            ServerEvent::SessionJoined {
                session_id: session_id.clone(),
                participant_id: participant_id.clone(),
                participant_count,
            },
        );

        if participant_count == 2 {
            if let Some(partner) = self
                .sessions
                .get_partner(&session_id, &participant_id)
                .cloned()
            {
                self.outbound.deliver(
                    connection_id,
                    ServerEvent::PartnerConnected {
                        partner_id: partner.participant_id.clone(),
                        partner_name: partner.display_name.clone(),
                    },
                );
                self.outbound.deliver(
                    partner.connection_id,
                    ServerEvent::PartnerConnected {
                        partner_id: participant_id,
                        partner_name: display_name,
                    },
                );

                info!(
                    target: "relay.core",
                    session_id = %session_id,
                    "Session paired"
                );
            }
        }

        RelayOutcome::Delivered
    }

    /// Forward an offer, answer or ICE candidate to `target_id`.
    pub fn signal(
        &mut self,
        connection_id: ConnectionId,
        kind: SignalKind,
        session_id: &SessionId,
        target_id: &ParticipantId,
        payload: Value,
    ) -> RelayOutcome {
        let Some(sender) = self.participants.lookup(&connection_id) else {
            return self.dropped(DropReason::UnknownParticipant, kind);
        };
        let Some(session) = self.sessions.get(session_id) else {
            return self.dropped(DropReason::UnknownSession, kind);
        };
        let Some(target) = session.participants.get(target_id) else {
            return self.dropped(DropReason::UnknownTarget, kind);
        };

        let target_connection = target.connection_id;
        let event = kind.into_event(sender, payload);
        self.outbound.deliver(target_connection, event);

        RelayOutcome::Delivered
    }

    fn dropped(&self, reason: DropReason, kind: SignalKind) -> RelayOutcome {
        debug!(
            target: "relay.core",
            reason = %reason,
            kind = ?kind,
            "Signal dropped"
        );
        RelayOutcome::Dropped(reason)
    }

    /// Tell the rest of `session_id` the caller is gone, then disconnect it.
    ///
    /// The cleanup is a full [`disconnect`](Self::disconnect), so occupants of
    /// the caller's own session hear `partner-disconnected` from it as well.
    /// When that is the named session, the partner gets two events.
    pub fn end_session(
        &mut self,
        connection_id: ConnectionId,
        session_id: &SessionId,
    ) -> RelayOutcome {
        let Some(caller) = self.participants.lookup(&connection_id).cloned() else {
            debug!(
                target: "relay.core",
                connection_id = %connection_id,
                "end-session from unknown connection ignored"
            );
            return RelayOutcome::Dropped(DropReason::UnknownParticipant);
        };

        self.notify_departure(session_id, &caller);
        self.detach(connection_id, true);

        info!(
            target: "relay.core",
            session_id = %session_id,
            "Session ended by participant"
        );

        RelayOutcome::Delivered
    }

    /// Remove a closed connection. Idempotent.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> RelayOutcome {
        match self.detach(connection_id, true) {
            Some(_) => RelayOutcome::Delivered,
            None => RelayOutcome::Dropped(DropReason::UnknownParticipant),
        }
    }

    /// Delete empty sessions older than `max_age`, returning their ids.
    pub fn reap_stale(&mut self, now: DateTime<Utc>, max_age: Duration) -> Vec<SessionId> {
        let stale: Vec<SessionId> = self.sessions.list_stale_empty(now, max_age).collect();

        for session_id in &stale {
            self.sessions.remove_session(session_id);
            info!(
                target: "relay.core",
                session_id = %session_id,
                "Removed stale empty session"
            );
        }

        stale
    }

    /// Drop a connection from both registries.
    fn detach(
        &mut self,
        connection_id: ConnectionId,
        notify_remaining: bool,
    ) -> Option<ParticipantInfo> {
        let info = self.participants.remove(&connection_id)?;

        let still_bound = self
            .sessions
            .get(&info.session_id)
            .and_then(|session| session.participants.get(&info.participant_id))
            .is_some_and(|member| member.connection_id == connection_id);

        if still_bound {
            let remaining = self
                .sessions
                .remove_participant(&info.session_id, &info.participant_id);

            debug!(
                target: "relay.core",
                session_id = %info.session_id,
                remaining,
                "Participant left session"
            );

            if notify_remaining {
                self.notify_departure(&info.session_id, &info);
            }
        }

        Some(info)
    }

    /// `partner-disconnected` to every member of `session_id` except `leaver`.
    fn notify_departure(&mut self, session_id: &SessionId, leaver: &ParticipantInfo) {
        let Some(session) = self.sessions.get(session_id) else {
            return;
        };

        let recipients: Vec<ConnectionId> = session
            .participants
            .values()
            .map(|member| member.connection_id)
            .filter(|connection| *connection != leaver.connection_id)
            .collect();

        for connection in recipients {
            self.outbound.deliver(
                connection,
                ServerEvent::PartnerDisconnected {
                    partner_id: leaver.participant_id.clone(),
                    partner_name: leaver.display_name.clone(),
                },
            );
        }
    }
}
