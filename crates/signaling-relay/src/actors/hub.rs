//! `ConnectionHub` - the live [`Outbound`] sink.
//!
//! Maps each connection to the bounded channel drained by its socket writer
//! task. Sends use `try_send` so a slow client can never stall the actor.

use crate::observability::metrics::record_outbound_dropped;
use crate::protocol::ServerEvent;
use crate::relay::Outbound;
use common::types::ConnectionId;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ConnectionHub {
    connections: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
}

impl ConnectionHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, sender: mpsc::Sender<ServerEvent>) {
        self.connections.insert(connection_id, sender);
    }

    pub fn unregister(&mut self, connection_id: &ConnectionId) -> bool {
        self.connections.remove(connection_id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Outbound for ConnectionHub {
    fn deliver(&mut self, connection_id: ConnectionId, event: ServerEvent) {
        let Some(sender) = self.connections.get(&connection_id) else {
            debug!(
                target: "relay.actor",
                connection_id = %connection_id,
                "No outbound channel for connection, event dropped"
            );
            record_outbound_dropped("unknown");
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    target: "relay.actor",
                    connection_id = %connection_id,
                    "Outbound channel full, event dropped"
                );
                record_outbound_dropped("full");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    target: "relay.actor",
                    connection_id = %connection_id,
                    "Outbound channel closed, event dropped"
                );
                record_outbound_dropped("closed");
            }
        }
    }
}
