//! Fixed identifiers and token settings.

use common::secret::SecretString;
use common::types::{ParticipantId, SessionId};
use token_service::config::TokenConfig;

/// Application id used by every test token.
pub const TEST_APP_ID: u32 = 4_242;

/// Shared signing secret for test tokens.
pub const TEST_SERVER_SECRET: &str = "relay-test-secret";

/// Default session id for single-session scenarios.
pub const TEST_SESSION: &str = "room-1";

/// Token settings matching [`TEST_APP_ID`] and [`TEST_SERVER_SECRET`].
pub fn test_token_config() -> TokenConfig {
    TokenConfig {
        app_id: TEST_APP_ID,
        server_secret: SecretString::from(TEST_SERVER_SECRET),
        default_ttl_seconds: 3_600,
        strict_signature: false,
    }
}

/// Same as [`test_token_config`] with signature checking turned on.
pub fn strict_token_config() -> TokenConfig {
    TokenConfig {
        strict_signature: true,
        ..test_token_config()
    }
}

pub fn session(id: &str) -> SessionId {
    SessionId::from(id)
}

pub fn participant(id: &str) -> ParticipantId {
    ParticipantId::from(id)
}
