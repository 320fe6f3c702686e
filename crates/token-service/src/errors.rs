use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    /// A required identifier was empty (e.g. issuing a token with no subject).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Wrong segment count or undecodable payload. Never leaves `validate`.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("userId and roomId are required")]
    MissingRequiredFields,

    #[error("Invalid userId format")]
    InvalidUserId,

    #[error("Invalid roomId format")]
    InvalidRoomId,

    #[error("token is required")]
    MissingToken,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Token too long")]
    TokenTooLong,

    /// Body rejected before field checks (not JSON, or not an object).
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl TokenError {
    /// Machine-readable error code returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::InvalidInput(_) => "INVALID_INPUT",
            TokenError::MalformedToken(_) | TokenError::InvalidTokenFormat => {
                "INVALID_TOKEN_FORMAT"
            }
            TokenError::Serialization(_) => "TOKEN_GENERATION_FAILED",
            TokenError::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            TokenError::InvalidUserId => "INVALID_USER_ID",
            TokenError::InvalidRoomId => "INVALID_ROOM_ID",
            TokenError::MissingToken => "MISSING_TOKEN",
            TokenError::TokenTooLong => "TOKEN_TOO_LONG",
            TokenError::InvalidBody(_) => "INVALID_REQUEST_BODY",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn client_message(&self) -> String {
        match self {
            TokenError::Serialization(_) => {
                "Internal server error while generating token".to_string()
            }
            TokenError::InvalidUserId => {
                "Invalid userId format. Must be alphanumeric with underscores/hyphens, max 64 characters"
                    .to_string()
            }
            TokenError::InvalidRoomId => {
                "Invalid roomId format. Must be alphanumeric with underscores/hyphens, max 128 characters"
                    .to_string()
            }
            TokenError::InvalidBody(_) => "Request body must be a JSON object".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.client_message(),
            },
        };

        (self.status_code(), Json(error_response)).into_response()
    }
}
