//! Token Service Library
//!
//! Issues and validates the HMAC-SHA256 access tokens that gate the
//! signaling relay.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Segment encoding and HMAC signing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `models` - Token and request/response models
//! - `observability` - Metrics
//! - `routes` - HTTP router
//! - `services` - Issuance and validation logic

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;

pub use config::TokenConfig;
pub use errors::TokenError;
pub use services::TokenService;
