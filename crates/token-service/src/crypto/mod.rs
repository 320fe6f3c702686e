//! Segment encoding and HMAC-SHA256 signing for access tokens.
//!
//! Tokens are three base64url segments joined by `.`: header, payload and
//! signature. Encoding always emits unpadded URL-safe base64. Decoding is
//! lenient: padding is optional and the standard alphabet is accepted as a
//! fallback, since third-party clients are inconsistent about both.

use crate::errors::TokenError;
use base64::{
    alphabet,
    engine::{
        general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
    },
    Engine as _,
};
use ring::hmac;

/// Accepts URL-safe input with or without `=` padding.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Accepts standard-alphabet input (`+`, `/`) with or without padding.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as one unpadded base64url token segment.
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode one token segment.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    LENIENT_URL_SAFE
        .decode(segment)
        .or_else(|_| LENIENT_STANDARD.decode(segment))
        .map_err(|e| TokenError::MalformedToken(format!("segment is not base64: {e}")))
}

/// Build the HMAC-SHA256 key for a shared secret.
pub fn signing_key(secret: &[u8]) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, secret)
}

/// Sign `message` and return the encoded signature segment.
pub fn sign(key: &hmac::Key, message: &[u8]) -> String {
    let tag = hmac::sign(key, message);
    encode_segment(tag.as_ref())
}

/// Constant-time check of an encoded signature segment against `message`.
///
/// Returns `false` for undecodable signatures rather than an error; callers
/// only care whether the token is acceptable.
pub fn verify(key: &hmac::Key, message: &[u8], signature_segment: &str) -> bool {
    match decode_segment(signature_segment) {
        Ok(signature) => hmac::verify(key, message, &signature).is_ok(),
        Err(_) => false,
    }
}
