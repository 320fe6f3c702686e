//! # Relay Test Utilities
//!
//! Shared test utilities for the signaling relay and token service.
//!
//! This crate provides:
//! - An in-memory [`Outbound`](signaling_relay::relay::Outbound) recorder
//! - Fixed token settings and a builder for hand-crafted tokens
//! - A server harness (`TestServer`) plus a WebSocket client for E2E tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = TestServer::spawn().await.unwrap();
//!     let mut alice = TestClient::connect(&server.ws_url()).await.unwrap();
//!
//!     alice.send_json(json!({"type": "join-session", ...})).await.unwrap();
//!     let joined = alice.recv().await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod recording;
pub mod server_harness;
pub mod token_builders;
pub mod ws_client;

// Re-export commonly used items
pub use fixtures::*;
pub use recording::*;
pub use server_harness::*;
pub use token_builders::*;
pub use ws_client::*;
