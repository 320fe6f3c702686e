//! Actor layer around the relay core.
//!
//! A single `RelayActor` task owns the [`SignalingRelay`](crate::relay::SignalingRelay)
//! and its [`ConnectionHub`], so every registry mutation, including reaper
//! sweeps, is serialized through one mailbox.

pub mod hub;
pub mod messages;
pub mod relay;

pub use hub::ConnectionHub;
pub use messages::{RelayMessage, RelayStatus, SessionInfo};
pub use relay::{RelayActor, RelayActorHandle};
