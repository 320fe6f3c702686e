//! Observability for the token service.
//!
//! Handlers are instrumented with `#[instrument(skip_all)]`; user ids, room
//! ids and token strings are never recorded as span fields.

pub mod metrics;

pub use metrics::{record_token_issuance, record_token_validation};
