//! In-memory registries owned by the relay core.
//!
//! Both registries are plain structs with no interior locking. They are
//! only ever touched from the relay actor's task.

pub mod participants;
pub mod sessions;

pub use participants::{ParticipantInfo, ParticipantRegistry};
pub use sessions::{Session, SessionRegistry};
