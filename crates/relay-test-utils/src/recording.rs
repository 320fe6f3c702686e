//! In-memory outbound sink for driving `SignalingRelay` directly.

use common::types::ConnectionId;
use signaling_relay::protocol::ServerEvent;
use signaling_relay::relay::Outbound;

/// Records every delivered event in order.
#[derive(Debug, Default)]
pub struct RecordingOutbound {
    pub sent: Vec<(ConnectionId, ServerEvent)>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered to one connection, in delivery order.
    pub fn events_for(&self, connection_id: ConnectionId) -> Vec<ServerEvent> {
        self.sent
            .iter()
            .filter(|(conn, _)| *conn == connection_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Drain everything recorded so far.
    pub fn take(&mut self) -> Vec<(ConnectionId, ServerEvent)> {
        std::mem::take(&mut self.sent)
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

impl Outbound for RecordingOutbound {
    fn deliver(&mut self, connection_id: ConnectionId, event: ServerEvent) {
        self.sent.push((connection_id, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::ParticipantId;

    fn partner_event(id: &str) -> ServerEvent {
        ServerEvent::PartnerConnected {
            partner_id: ParticipantId::from(id),
            partner_name: id.to_string(),
        }
    }

    #[test]
    fn test_events_for_filters_by_connection() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut recorder = RecordingOutbound::new();

        recorder.deliver(a, partner_event("x"));
        recorder.deliver(b, partner_event("y"));
        recorder.deliver(a, partner_event("z"));

        assert_eq!(recorder.events_for(a), vec![partner_event("x"), partner_event("z")]);
        assert_eq!(recorder.events_for(b).len(), 1);
    }

    #[test]
    fn test_take_drains() {
        let mut recorder = RecordingOutbound::new();
        recorder.deliver(ConnectionId::new(), partner_event("x"));

        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.is_empty());
    }
}
