//! Builder for hand-crafted test tokens.
//!
//! `TokenService` only issues well-formed tokens; this builder also produces
//! foreign, expired and structurally odd ones.

use crate::fixtures::{TEST_APP_ID, TEST_SERVER_SECRET};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use token_service::crypto;

/// Builder for signed test tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .expires_in(-10)
///     .build();
/// ```
pub struct TestTokenBuilder {
    iss: Value,
    exp: Value,
    user_id: String,
    iat: i64,
    secret: String,
    payload_override: Option<Value>,
}

impl TestTokenBuilder {
    /// Create a builder with a valid one-hour token for the test app.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            iss: json!(TEST_APP_ID),
            exp: json!((now + Duration::seconds(3600)).timestamp()),
            user_id: "test-user".to_string(),
            iat: now.timestamp(),
            secret: TEST_SERVER_SECRET.to_string(),
            payload_override: None,
        }
    }

    pub fn for_user(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    pub fn issued_by(mut self, app_id: u32) -> Self {
        self.iss = json!(app_id);
        self
    }

    /// Set `iss` to an arbitrary JSON value (e.g. a string).
    pub fn issuer_value(mut self, iss: Value) -> Self {
        self.iss = iss;
        self
    }

    /// Expiry relative to now; negative values produce expired tokens.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = json!((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    pub fn expires_at(mut self, exp: Value) -> Self {
        self.exp = exp;
        self
    }

    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// Replace the whole payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload_override = Some(payload);
        self
    }

    pub fn claims(&self) -> Value {
        self.payload_override.clone().unwrap_or_else(|| {
            json!({
                "iss": self.iss,
                "exp": self.exp,
                "userId": self.user_id,
                "iat": self.iat,
            })
        })
    }

    /// Encode and sign as `header.payload.signature`.
    pub fn build(self) -> String {
        let header = json!({"alg": "HS256", "typ": "JWT"});
        let signing_input = format!(
            "{}.{}",
            crypto::encode_segment(header.to_string().as_bytes()),
            crypto::encode_segment(self.claims().to_string().as_bytes())
        );
        let key = crypto::signing_key(self.secret.as_bytes());
        let signature = crypto::sign(&key, signing_input.as_bytes());
        format!("{signing_input}.{signature}")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
