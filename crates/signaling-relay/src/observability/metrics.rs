//! Metrics definitions for the signaling relay.
//!
//! All metrics follow Prometheus naming conventions:
//! - `relay_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! - `event`: 6 values (the five client event kinds plus `disconnect`)
//! - `outcome`: 4 values (delivered plus one per drop reason)
//! - `reason`: 3 values (full, closed, unknown)

use metrics::{counter, gauge};

/// Record one relay operation and its outcome
///
/// Metric: `relay_events_total`
/// Labels: `event`, `outcome`
pub fn record_relay_event(event: &'static str, outcome: &'static str) {
    counter!("relay_events_total", "event" => event, "outcome" => outcome).increment(1);
}

/// Record a client frame rejected before reaching the relay
///
/// Metric: `relay_protocol_errors_total`
/// Labels: `code`
pub fn record_protocol_error(code: &'static str) {
    counter!("relay_protocol_errors_total", "code" => code).increment(1);
}

/// Record an outbound event that could not be queued
///
/// Metric: `relay_outbound_dropped_total`
/// Labels: `reason`
pub fn record_outbound_dropped(reason: &'static str) {
    counter!("relay_outbound_dropped_total", "reason" => reason).increment(1);
}

/// Record sessions removed by one reaper sweep
///
/// Metric: `relay_sessions_reaped_total`
pub fn record_sessions_reaped(count: usize) {
    counter!("relay_sessions_reaped_total").increment(count as u64);
}

/// Update registry size gauges
///
/// Metrics: `relay_active_sessions`, `relay_active_participants`, `relay_open_connections`
#[allow(clippy::cast_precision_loss)]
pub fn set_registry_sizes(sessions: usize, participants: usize, connections: usize) {
    gauge!("relay_active_sessions").set(sessions as f64);
    gauge!("relay_active_participants").set(participants as f64);
    gauge!("relay_open_connections").set(connections as f64);
}
