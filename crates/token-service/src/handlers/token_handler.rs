//! HTTP handlers for token issuance and validation.

use crate::errors::TokenError;
use crate::models::{
    IssueTokenRequest, IssueTokenResponse, ValidateTokenRequest, ValidateTokenResponse,
};
use crate::observability::metrics::{record_token_issuance, record_token_validation};
use crate::services::TokenService;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Maximum accepted token length on the validation endpoint.
pub const MAX_TOKEN_LENGTH: usize = 2048;

pub const MAX_USER_ID_LENGTH: usize = 64;
pub const MAX_ROOM_ID_LENGTH: usize = 128;

/// Identifiers are 1..=max chars of `[A-Za-z0-9_-]`.
fn is_valid_identifier(value: &str, max_len: usize) -> bool {
    !value.is_empty()
        && value.len() <= max_len
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// `null`, `false`, `0`, and `""` count as absent; anything else is present,
/// whatever its type.
fn present(field: Option<Value>) -> Option<Value> {
    field.filter(|value| match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Unwrap the JSON body, mapping extractor rejections onto [`TokenError`].
///
/// A request without a JSON content type is read as an empty body, so it
/// fails the field checks instead.
fn read_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, TokenError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => {
            debug!(
                target: "token.handler",
                reason = %rejection.body_text(),
                "Request body rejected"
            );
            Err(TokenError::InvalidBody(rejection.body_text()))
        }
    }
}

/// Handle token request.
///
/// POST /token
///
/// Issues a token for `userId` with the configured default lifetime. The
/// `roomId` is validated and echoed back but not embedded in the token.
#[instrument(name = "token.issue", target = "token.handler", skip_all, fields(status))]
pub async fn handle_issue_token(
    State(service): State<Arc<TokenService>>,
    payload: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<Json<IssueTokenResponse>, TokenError> {
    let start = Instant::now();

    let result = read_body(payload).and_then(|body| issue_token_internal(&service, body));

    let status = if result.is_ok() { "success" } else { "error" };
    tracing::Span::current().record("status", status);
    record_token_issuance(status, start.elapsed());

    if let Err(e) = &result {
        warn!(target: "token.handler", code = e.code(), "Token issuance failed");
    }

    result.map(Json)
}

fn issue_token_internal(
    service: &TokenService,
    payload: IssueTokenRequest,
) -> Result<IssueTokenResponse, TokenError> {
    let (Some(user_id), Some(room_id)) = (present(payload.user_id), present(payload.room_id))
    else {
        return Err(TokenError::MissingRequiredFields);
    };

    let user_id = match user_id {
        Value::String(id) if is_valid_identifier(&id, MAX_USER_ID_LENGTH) => id,
        _ => return Err(TokenError::InvalidUserId),
    };

    let room_id = match room_id {
        Value::String(id) if is_valid_identifier(&id, MAX_ROOM_ID_LENGTH) => id,
        _ => return Err(TokenError::InvalidRoomId),
    };

    let token = service.issue_default(&user_id)?;

    Ok(IssueTokenResponse {
        token,
        user_id,
        room_id,
        expires_in: service.default_ttl_seconds(),
        generated_at: Utc::now(),
    })
}

/// Handle token validation request.
///
/// POST /token/validate
///
/// Responds `200 {"valid": bool}` for any well-shaped request; only input
/// that fails basic shape checks gets a 400.
#[instrument(name = "token.validate", target = "token.handler", skip_all, fields(valid))]
pub async fn handle_validate_token(
    State(service): State<Arc<TokenService>>,
    payload: Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> Result<Json<ValidateTokenResponse>, TokenError> {
    let token = match read_body(payload).and_then(|body| check_token_shape(body.token)) {
        Ok(token) => token,
        Err(e) => {
            record_token_validation("rejected");
            return Err(e);
        }
    };

    let valid = service.check(&token);
    tracing::Span::current().record("valid", valid);
    record_token_validation(if valid { "valid" } else { "invalid" });

    Ok(Json(ValidateTokenResponse {
        valid,
        validated_at: Utc::now(),
    }))
}

fn check_token_shape(token: Option<Value>) -> Result<String, TokenError> {
    let token = match present(token).ok_or(TokenError::MissingToken)? {
        Value::String(token) if token.contains('.') => token,
        _ => return Err(TokenError::InvalidTokenFormat),
    };

    if token.len() > MAX_TOKEN_LENGTH {
        return Err(TokenError::TokenTooLong);
    }

    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(is_valid_identifier("user_1-A", MAX_USER_ID_LENGTH));
        assert!(is_valid_identifier(&"a".repeat(64), MAX_USER_ID_LENGTH));

        assert!(!is_valid_identifier("", MAX_USER_ID_LENGTH));
        assert!(!is_valid_identifier(&"a".repeat(65), MAX_USER_ID_LENGTH));
        assert!(!is_valid_identifier("has space", MAX_USER_ID_LENGTH));
        assert!(!is_valid_identifier("<script>", MAX_USER_ID_LENGTH));
        assert!(!is_valid_identifier("émile", MAX_USER_ID_LENGTH));
    }

    #[test]
    fn test_room_id_allows_longer_values() {
        let room = "r".repeat(128);
        assert!(is_valid_identifier(&room, MAX_ROOM_ID_LENGTH));
        assert!(!is_valid_identifier(&room, MAX_USER_ID_LENGTH));
    }

    #[test]
    fn test_token_shape_checks() {
        assert!(matches!(check_token_shape(None), Err(TokenError::MissingToken)));
        assert!(matches!(
            check_token_shape(Some(Value::from(""))),
            Err(TokenError::MissingToken)
        ));
        assert!(matches!(
            check_token_shape(Some(Value::from("nodots"))),
            Err(TokenError::InvalidTokenFormat)
        ));
        assert!(matches!(
            check_token_shape(Some(Value::from(format!("a.{}", "b".repeat(MAX_TOKEN_LENGTH))))),
            Err(TokenError::TokenTooLong)
        ));
        // Format is checked before length
        assert!(matches!(
            check_token_shape(Some(Value::from("b".repeat(MAX_TOKEN_LENGTH + 1)))),
            Err(TokenError::InvalidTokenFormat)
        ));
        assert_eq!(check_token_shape(Some(Value::from("a.b.c"))).unwrap(), "a.b.c");
    }

    #[test]
    fn test_non_string_token_is_format_error() {
        for token in [Value::from(123), Value::from(true), serde_json::json!(["a.b"])] {
            assert!(matches!(
                check_token_shape(Some(token)),
                Err(TokenError::InvalidTokenFormat)
            ));
        }
        // Falsy non-strings read as missing
        for token in [Value::Null, Value::from(0), Value::from(false)] {
            assert!(matches!(
                check_token_shape(Some(token)),
                Err(TokenError::MissingToken)
            ));
        }
    }

    #[test]
    fn test_presence_follows_truthiness() {
        assert!(present(Some(Value::from("x"))).is_some());
        assert!(present(Some(Value::from(5))).is_some());
        assert!(present(Some(serde_json::json!({}))).is_some());
        assert!(present(Some(Value::from(""))).is_none());
        assert!(present(Some(Value::from(0.0))).is_none());
        assert!(present(None).is_none());
    }
}
