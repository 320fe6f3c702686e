//! Observability for the signaling relay.
//!
//! Spans and log lines carry session ids and connection ids but never
//! negotiation payloads or display names.

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
