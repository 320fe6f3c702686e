//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for the token signing secret and any
//! other credential that flows through configuration.
//!
//! `SecretString` implements `Debug` with redaction, so a config struct that
//! derives or hand-writes `Debug` can never print the signing secret through
//! `{:?}` or a `tracing` field. The value is zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let secret = SecretString::from("server-secret");
//! assert!(!format!("{secret:?}").contains("server-secret"));
//!
//! // HMAC keys are built from the exposed bytes at the point of use only.
//! let key_bytes: &[u8] = secret.expose_secret().as_bytes();
//! assert_eq!(key_bytes.len(), 13);
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
