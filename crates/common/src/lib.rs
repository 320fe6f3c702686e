//! Common utilities and types shared across the Mend signaling crates.

#![warn(clippy::pedantic)]

/// Module for identifier newtypes (sessions, participants, connections)
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;
