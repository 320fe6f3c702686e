use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Fixed token header. Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Signed token payload.
///
/// Serialized in declaration order: `iss`, `exp`, `userId`, `iat`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Application id of the issuer.
    pub iss: u32,
    /// Expiry, unix seconds.
    pub exp: i64,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Issued at, unix seconds.
    pub iat: i64,
}

/// Redacts `user_id`, which is caller-identifying.
impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("user_id", &"[REDACTED]")
            .field("iat", &self.iat)
            .finish()
    }
}

// ============================================================================
// HTTP request / response bodies
// ============================================================================

/// `POST /token` body.
///
/// Fields are raw JSON so the handler decides between
/// `MISSING_REQUIRED_FIELDS` and `INVALID_USER_ID`/`INVALID_ROOM_ID` instead
/// of the extractor rejecting a wrongly typed field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub room_id: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenResponse {
    pub token: String,
    pub user_id: String,
    pub room_id: String,
    pub expires_in: u64,
    pub generated_at: DateTime<Utc>,
}

/// `POST /token/validate` body. A non-string `token` is `INVALID_TOKEN_FORMAT`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateTokenRequest {
    #[serde(default)]
    pub token: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub validated_at: DateTime<Utc>,
}
