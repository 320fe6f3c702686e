//! `RelayActor` - single owner of all relay state.
//!
//! Transport tasks and the session reaper talk to the actor only through a
//! [`RelayActorHandle`]. The actor processes one message at a time, which is
//! what keeps the participant and session registries in agreement.
//!
//! # Shutdown
//!
//! Cancelling the actor's token ends the loop after the current message.
//! Handles then fail with [`RelayError::Internal`].

use super::hub::ConnectionHub;
use super::messages::{RelayMessage, RelayStatus, SessionInfo};
use crate::errors::RelayError;
use crate::observability::metrics::{
    record_relay_event, record_sessions_reaped, set_registry_sizes,
};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::relay::{RelayOutcome, SignalingRelay};

use chrono::{DateTime, Utc};
use common::types::{ConnectionId, SessionId};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Default channel buffer size for the relay mailbox.
const RELAY_CHANNEL_BUFFER: usize = 1000;

/// Handle to the `RelayActor`.
///
/// Cheap to clone; every transport task holds one.
#[derive(Clone, Debug)]
pub struct RelayActorHandle {
    sender: mpsc::Sender<RelayMessage>,
    cancel_token: CancellationToken,
}

impl RelayActorHandle {
    /// Spawn the actor and return a handle plus its task.
    ///
    /// The actor stops when `cancel_token` is cancelled or every handle is
    /// dropped.
    #[must_use]
    pub fn spawn(cancel_token: CancellationToken) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(RELAY_CHANNEL_BUFFER);
        let actor = RelayActor::new(receiver, cancel_token.clone());
        let task = tokio::spawn(actor.run());

        (
            Self {
                sender,
                cancel_token,
            },
            task,
        )
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RelayMessage,
    ) -> Result<T, RelayError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| RelayError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RelayError::Internal(format!("response receive failed: {e}")))
    }

    /// Attach a connection's outbound channel.
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        outbound: mpsc::Sender<ServerEvent>,
    ) -> Result<(), RelayError> {
        self.request(|respond_to| RelayMessage::Connect {
            connection_id,
            outbound,
            respond_to,
        })
        .await
    }

    /// Route one client event.
    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<RelayOutcome, RelayError> {
        self.request(|respond_to| RelayMessage::Event {
            connection_id,
            event,
            respond_to,
        })
        .await
    }

    /// Remove a connection from the relay and the hub.
    pub async fn disconnect(
        &self,
        connection_id: ConnectionId,
    ) -> Result<RelayOutcome, RelayError> {
        self.request(|respond_to| RelayMessage::Disconnect {
            connection_id,
            respond_to,
        })
        .await
    }

    /// Run one stale-session sweep.
    pub async fn reap_stale(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Result<Vec<SessionId>, RelayError> {
        self.request(|respond_to| RelayMessage::ReapStale {
            now,
            max_age,
            respond_to,
        })
        .await
    }

    pub async fn get_status(&self) -> Result<RelayStatus, RelayError> {
        self.request(|respond_to| RelayMessage::GetStatus { respond_to })
            .await
    }

    pub async fn get_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<SessionInfo>, RelayError> {
        self.request(|respond_to| RelayMessage::GetSession {
            session_id,
            respond_to,
        })
        .await
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Child token for tasks that should stop with the actor.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// The `RelayActor` implementation.
pub struct RelayActor {
    receiver: mpsc::Receiver<RelayMessage>,
    cancel_token: CancellationToken,
    relay: SignalingRelay<ConnectionHub>,
    sweeps: u64,
    sessions_reaped: u64,
    messages_processed: u64,
}

impl RelayActor {
    fn new(receiver: mpsc::Receiver<RelayMessage>, cancel_token: CancellationToken) -> Self {
        Self {
            receiver,
            cancel_token,
            relay: SignalingRelay::new(ConnectionHub::new()),
            sweeps: 0,
            sessions_reaped: 0,
            messages_processed: 0,
        }
    }

    #[instrument(skip_all, name = "relay.actor")]
    async fn run(mut self) {
        info!(target: "relay.actor", "RelayActor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "relay.actor",
                        "RelayActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.handle_message(message);
                            self.messages_processed += 1;
                            self.update_gauges();
                        }
                        None => {
                            info!(
                                target: "relay.actor",
                                "RelayActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "relay.actor",
            sessions_remaining = self.relay.sessions().len(),
            messages_processed = self.messages_processed,
            "RelayActor stopped"
        );
    }

    fn handle_message(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::Connect {
                connection_id,
                outbound,
                respond_to,
            } => {
                self.relay.outbound_mut().register(connection_id, outbound);
                debug!(
                    target: "relay.actor",
                    connection_id = %connection_id,
                    "Connection attached"
                );
                let _ = respond_to.send(());
            }

            RelayMessage::Event {
                connection_id,
                event,
                respond_to,
            } => {
                let kind = event.kind();
                let outcome = self.relay.handle_event(connection_id, event);
                record_relay_event(kind, outcome.as_str());
                let _ = respond_to.send(outcome);
            }

            RelayMessage::Disconnect {
                connection_id,
                respond_to,
            } => {
                let outcome = self.relay.disconnect(connection_id);
                self.relay.outbound_mut().unregister(&connection_id);
                record_relay_event("disconnect", outcome.as_str());
                debug!(
                    target: "relay.actor",
                    connection_id = %connection_id,
                    outcome = outcome.as_str(),
                    "Connection detached"
                );
                let _ = respond_to.send(outcome);
            }

            RelayMessage::ReapStale {
                now,
                max_age,
                respond_to,
            } => {
                let reaped = self.relay.reap_stale(now, max_age);
                self.sweeps += 1;
                self.sessions_reaped += reaped.len() as u64;
                record_sessions_reaped(reaped.len());
                let _ = respond_to.send(reaped);
            }

            RelayMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }

            RelayMessage::GetSession {
                session_id,
                respond_to,
            } => {
                let info = self.relay.sessions().get(&session_id).map(|session| {
                    let mut participant_ids: Vec<_> =
                        session.participants.keys().cloned().collect();
                    participant_ids.sort();
                    SessionInfo {
                        session_id: session.session_id.clone(),
                        participant_ids,
                        created_at: session.created_at,
                    }
                });
                let _ = respond_to.send(info);
            }
        }
    }

    fn status(&self) -> RelayStatus {
        RelayStatus {
            sessions: self.relay.sessions().len(),
            participants: self.relay.participants().len(),
            connections: self.relay.outbound().len(),
            sweeps: self.sweeps,
            sessions_reaped: self.sessions_reaped,
        }
    }

    fn update_gauges(&self) {
        set_registry_sizes(
            self.relay.sessions().len(),
            self.relay.participants().len(),
            self.relay.outbound().len(),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_starts_empty() {
        let (handle, _task) = RelayActorHandle::spawn(CancellationToken::new());
        assert_eq!(handle.get_status().await.unwrap(), RelayStatus::default());
    }

    #[tokio::test]
    async fn test_connect_counts_connections() {
        let (handle, _task) = RelayActorHandle::spawn(CancellationToken::new());
        let (tx, _rx) = mpsc::channel(8);

        handle.connect(ConnectionId::new(), tx).await.unwrap();

        assert_eq!(handle.get_status().await.unwrap().connections, 1);
    }

    #[tokio::test]
    async fn test_join_reaches_outbound_channel() {
        let (handle, _task) = RelayActorHandle::spawn(CancellationToken::new());
        let conn = ConnectionId::new();
        let (tx, mut rx) = mpsc::channel(8);
        handle.connect(conn, tx).await.unwrap();

        let outcome = handle
            .dispatch(
                conn,
                ClientEvent::JoinSession {
                    session_id: "S1".into(),
                    participant_id: "A".into(),
                    participant_name: "Alice".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::Delivered);
        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerEvent::SessionJoined { participant_count: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_disconnect_unregisters_and_closes_channel() {
        let (handle, _task) = RelayActorHandle::spawn(CancellationToken::new());
        let conn = ConnectionId::new();
        let (tx, mut rx) = mpsc::channel(8);
        handle.connect(conn, tx).await.unwrap();

        handle.disconnect(conn).await.unwrap();

        // The hub held the only sender
        assert!(rx.recv().await.is_none());
        assert_eq!(handle.get_status().await.unwrap().connections, 0);
    }

    #[tokio::test]
    async fn test_cancelled_actor_returns_internal_error() {
        let (handle, task) = RelayActorHandle::spawn(CancellationToken::new());

        handle.cancel();
        task.await.unwrap();

        assert!(handle.is_cancelled());
        assert!(matches!(
            handle.get_status().await,
            Err(RelayError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_reap_stale_counts_sweeps() {
        let (handle, _task) = RelayActorHandle::spawn(CancellationToken::new());

        let reaped = handle
            .reap_stale(Utc::now(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(reaped.is_empty());
        let status = handle.get_status().await.unwrap();
        assert_eq!(status.sweeps, 1);
        assert_eq!(status.sessions_reaped, 0);
    }
}
