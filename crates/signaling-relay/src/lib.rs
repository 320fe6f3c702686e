//! Signaling Relay Library
//!
//! Pairs two participants per named session and relays their WebRTC
//! negotiation messages (offer, answer, ICE candidates) so they can open a
//! direct peer-to-peer channel.
//!
//! # Architecture
//!
//! - `relay` - synchronous core owning the participant and session registries
//! - `actors` - `RelayActor`, the single task that owns the core
//! - `tasks` - stale-session reaper
//! - `transport` - WebSocket adapter
//! - `routes` - HTTP router (WebSocket, token API, health)
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `errors` - Error types
//! - `observability` - Health checks and metrics
//! - `protocol` - Client and server event types
//! - `registry` - Participant and session registries

pub mod actors;
pub mod config;
pub mod errors;
pub mod observability;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod tasks;
pub mod transport;
