//! Access token issuance and validation.
//!
//! Plain `validate` only checks the payload: `exp` must be in the future and
//! `iss` must equal the configured app id. The signature segment is carried
//! but not recomputed. `validate_strict` additionally verifies the HMAC in
//! constant time; the service picks one or the other via
//! [`TokenService::check`] according to `TOKEN_STRICT_SIGNATURE`.

use crate::config::TokenConfig;
use crate::crypto;
use crate::errors::TokenError;
use crate::models::{TokenClaims, TokenHeader};
use chrono::Utc;
use common::secret::ExposeSecret;
use ring::hmac;
use serde_json::Value;
use std::fmt;
use tracing::{debug, instrument};

/// Issues and validates access tokens for one application id.
pub struct TokenService {
    app_id: u32,
    key: hmac::Key,
    default_ttl_seconds: u64,
    strict_signature: bool,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("app_id", &self.app_id)
            .field("key", &"[REDACTED]")
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .field("strict_signature", &self.strict_signature)
            .finish()
    }
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            app_id: config.app_id,
            key: crypto::signing_key(config.server_secret.expose_secret().as_bytes()),
            default_ttl_seconds: config.default_ttl_seconds,
            strict_signature: config.strict_signature,
        }
    }

    pub fn app_id(&self) -> u32 {
        self.app_id
    }

    pub fn default_ttl_seconds(&self) -> u64 {
        self.default_ttl_seconds
    }

    /// Issue a token for `subject_id` valid for `ttl_seconds` from now.
    pub fn issue(&self, subject_id: &str, ttl_seconds: u64) -> Result<String, TokenError> {
        self.issue_at(subject_id, ttl_seconds, Utc::now().timestamp())
    }

    /// Issue a token with the configured default lifetime.
    pub fn issue_default(&self, subject_id: &str) -> Result<String, TokenError> {
        self.issue(subject_id, self.default_ttl_seconds)
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    #[instrument(target = "token.service", skip_all, fields(ttl_seconds = ttl_seconds))]
    pub fn issue_at(
        &self,
        subject_id: &str,
        ttl_seconds: u64,
        now: i64,
    ) -> Result<String, TokenError> {
        if subject_id.is_empty() {
            return Err(TokenError::InvalidInput(
                "subject id must not be empty".to_string(),
            ));
        }

        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            iss: self.app_id,
            exp: now.saturating_add(ttl),
            user_id: subject_id.to_string(),
            iat: now,
        };

        let header = serde_json::to_vec(&TokenHeader::default())
            .map_err(|e| TokenError::Serialization(format!("header: {e}")))?;
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| TokenError::Serialization(format!("claims: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            crypto::encode_segment(&header),
            crypto::encode_segment(&payload)
        );
        let signature = crypto::sign(&self.key, signing_input.as_bytes());

        debug!(target: "token.service", exp = claims.exp, "Issued token");
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Check expiry and issuer. Never fails; malformed input is `false`.
    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now().timestamp())
    }

    pub fn validate_at(&self, token: &str, now: i64) -> bool {
        match self.decode_payload(token) {
            Ok(payload) => self.claims_are_current(&payload, now),
            Err(e) => {
                debug!(target: "token.service", error = %e, "Token rejected");
                false
            }
        }
    }

    /// Like [`validate`](Self::validate), and the signature must also verify.
    pub fn validate_strict(&self, token: &str) -> bool {
        self.validate_strict_at(token, Utc::now().timestamp())
    }

    pub fn validate_strict_at(&self, token: &str, now: i64) -> bool {
        let Some((signing_input, signature)) = token.rsplit_once('.') else {
            return false;
        };

        if !crypto::verify(&self.key, signing_input.as_bytes(), signature) {
            debug!(target: "token.service", "Token signature mismatch");
            return false;
        }

        self.validate_at(token, now)
    }

    /// Validate using the configured mode.
    pub fn check(&self, token: &str) -> bool {
        if self.strict_signature {
            self.validate_strict(token)
        } else {
            self.validate(token)
        }
    }

    fn decode_payload(&self, token: &str) -> Result<Value, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(TokenError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let payload_segment = segments
            .get(1)
            .ok_or_else(|| TokenError::MalformedToken("missing payload".to_string()))?;
        let bytes = crypto::decode_segment(payload_segment)?;

        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::MalformedToken(format!("payload is not JSON: {e}")))?;

        if !payload.is_object() {
            return Err(TokenError::MalformedToken(
                "payload is not an object".to_string(),
            ));
        }

        Ok(payload)
    }

    // Numeric claims are compared as JSON numbers, so `iss` of `42.0` equals
    // app id 42 and a fractional `exp` is fine.
    #[allow(clippy::float_cmp)]
    fn claims_are_current(&self, payload: &Value, now: i64) -> bool {
        let Some(exp) = payload.get("exp").and_then(Value::as_f64) else {
            debug!(target: "token.service", "Token missing numeric exp");
            return false;
        };

        if exp <= now as f64 {
            debug!(target: "token.service", "Token expired");
            return false;
        }

        match payload.get("iss").and_then(Value::as_f64) {
            Some(iss) if iss == f64::from(self.app_id) => true,
            _ => {
                debug!(target: "token.service", "Token issuer mismatch");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TOKEN_TTL_SECONDS;
    use common::secret::SecretString;

    const APP_ID: u32 = 123_456_789;
    const NOW: i64 = 1_700_000_000;

    fn service_with(app_id: u32, secret: &str, strict: bool) -> TokenService {
        TokenService::new(&TokenConfig {
            app_id,
            server_secret: SecretString::from(secret.to_string()),
            default_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            strict_signature: strict,
        })
    }

    fn service() -> TokenService {
        service_with(APP_ID, "test-secret", false)
    }

    fn encode_json(value: &Value) -> String {
        crypto::encode_segment(&serde_json::to_vec(value).unwrap())
    }

    fn payload_of(token: &str) -> Value {
        let segment = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&crypto::decode_segment(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_issue_produces_three_segments() {
        let token = service().issue_at("alice", 3600, NOW).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_issue_claims() {
        let token = service().issue_at("alice", 3600, NOW).unwrap();
        let payload = payload_of(&token);

        assert_eq!(payload["iss"], APP_ID);
        assert_eq!(payload["exp"], NOW + 3600);
        assert_eq!(payload["userId"], "alice");
        assert_eq!(payload["iat"], NOW);
    }

    #[test]
    fn test_issue_header() {
        let token = service().issue_at("alice", 3600, NOW).unwrap();
        let header_segment = token.split('.').next().unwrap();
        let header = crypto::decode_segment(header_segment).unwrap();

        assert_eq!(header, br#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn test_issue_is_deterministic_for_fixed_time() {
        let svc = service();
        assert_eq!(
            svc.issue_at("alice", 60, NOW).unwrap(),
            svc.issue_at("alice", 60, NOW).unwrap()
        );
    }

    #[test]
    fn test_issue_rejects_empty_subject() {
        let result = service().issue_at("", 60, NOW);
        assert!(matches!(result, Err(TokenError::InvalidInput(_))));
    }

    #[test]
    fn test_issue_default_uses_configured_ttl() {
        let svc = service();
        let token = svc.issue_default("alice").unwrap();
        let payload = payload_of(&token);

        let exp = payload["exp"].as_i64().unwrap();
        let iat = payload["iat"].as_i64().unwrap();
        assert_eq!(exp - iat, 86_400);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let token = service().issue_at("alice", u64::MAX, NOW).unwrap();
        assert_eq!(payload_of(&token)["exp"], i64::MAX);
    }

    #[test]
    fn test_validate_fresh_token() {
        let svc = service();
        let token = svc.issue_at("alice", 3600, NOW).unwrap();
        assert!(svc.validate_at(&token, NOW + 10));
    }

    #[test]
    fn test_validate_expiry_boundary() {
        let svc = service();
        let token = svc.issue_at("alice", 3600, NOW).unwrap();

        assert!(svc.validate_at(&token, NOW + 3599));
        assert!(!svc.validate_at(&token, NOW + 3600));
        assert!(!svc.validate_at(&token, NOW + 7200));
    }

    #[test]
    fn test_validate_rejects_other_app_id() {
        let token = service_with(1, "test-secret", false)
            .issue_at("alice", 3600, NOW)
            .unwrap();
        assert!(!service().validate_at(&token, NOW));
    }

    #[test]
    fn test_validate_malformed_inputs() {
        let svc = service();
        for token in ["", "abc", "a.b", "a.b.c.d", "x.%%%.y", "x.bm90IGpzb24.y"] {
            assert!(!svc.validate_at(token, NOW), "accepted {token:?}");
        }
    }

    #[test]
    fn test_validate_non_object_payload() {
        let token = format!("h.{}.s", encode_json(&serde_json::json!([1, 2, 3])));
        assert!(!service().validate_at(&token, NOW));
    }

    #[test]
    fn test_validate_missing_or_string_claims() {
        let svc = service();
        let missing_exp = format!("h.{}.s", encode_json(&serde_json::json!({"iss": APP_ID})));
        let string_iss = format!(
            "h.{}.s",
            encode_json(&serde_json::json!({"iss": APP_ID.to_string(), "exp": NOW + 60}))
        );

        assert!(!svc.validate_at(&missing_exp, NOW));
        assert!(!svc.validate_at(&string_iss, NOW));
    }

    #[test]
    fn test_non_strict_ignores_signature() {
        let svc = service();
        // Hand-built token with a bogus signature still passes payload checks
        let token = format!(
            "h.{}.not-a-signature",
            encode_json(&serde_json::json!({"iss": APP_ID, "exp": NOW + 60}))
        );

        assert!(svc.validate_at(&token, NOW));
        assert!(!svc.validate_strict_at(&token, NOW));
    }

    #[test]
    fn test_float_encoded_issuer_accepted() {
        let svc = service();
        let float_iss = format!(
            "h.{}.s",
            encode_json(&serde_json::json!({"iss": f64::from(APP_ID), "exp": NOW + 60}))
        );
        let fractional_iss = format!(
            "h.{}.s",
            encode_json(&serde_json::json!({"iss": f64::from(APP_ID) + 0.5, "exp": NOW + 60}))
        );

        assert!(svc.validate_at(&float_iss, NOW));
        assert!(!svc.validate_at(&fractional_iss, NOW));
    }

    #[test]
    fn test_fractional_exp_accepted() {
        let token = format!(
            "h.{}.s",
            encode_json(&serde_json::json!({"iss": APP_ID, "exp": (NOW as f64) + 0.5}))
        );
        assert!(service().validate_at(&token, NOW));
    }

    #[test]
    fn test_validate_accepts_padded_payload() {
        let svc = service();
        let token = svc.issue_at("alice", 3600, NOW).unwrap();
        let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
        while segments[1].len() % 4 != 0 {
            segments[1].push('=');
        }

        assert!(svc.validate_at(&segments.join("."), NOW));
    }

    #[test]
    fn test_strict_accepts_own_tokens() {
        let svc = service_with(APP_ID, "test-secret", true);
        let token = svc.issue_at("alice", 3600, NOW).unwrap();
        assert!(svc.validate_strict_at(&token, NOW));
    }

    #[test]
    fn test_strict_rejects_wrong_secret() {
        let token = service_with(APP_ID, "other-secret", false)
            .issue_at("alice", 3600, NOW)
            .unwrap();

        let svc = service();
        assert!(svc.validate_at(&token, NOW));
        assert!(!svc.validate_strict_at(&token, NOW));
    }

    #[test]
    fn test_strict_rejects_tampered_payload() {
        let svc = service();
        let token = svc.issue_at("alice", 60, NOW).unwrap();
        let mut segments: Vec<&str> = token.split('.').collect();
        let forged = encode_json(&serde_json::json!({
            "iss": APP_ID, "exp": NOW + 999_999, "userId": "mallory", "iat": NOW
        }));
        segments[1] = &forged;

        assert!(!svc.validate_strict_at(&segments.join("."), NOW));
    }

    #[test]
    fn test_strict_still_checks_expiry() {
        let svc = service();
        let token = svc.issue_at("alice", 60, NOW).unwrap();
        assert!(!svc.validate_strict_at(&token, NOW + 61));
    }

    #[test]
    fn test_check_follows_configured_mode() {
        let forged = format!(
            "h.{}.s",
            encode_json(&serde_json::json!({"iss": APP_ID, "exp": i64::MAX}))
        );

        assert!(service_with(APP_ID, "test-secret", false).check(&forged));
        assert!(!service_with(APP_ID, "test-secret", true).check(&forged));
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", service());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-secret"));
    }
}
