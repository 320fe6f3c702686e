//! Metrics definitions for the token service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `token_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `status`: 2 values (success, error)
//! - `result`: 3 values (valid, invalid, rejected)

use metrics::{counter, histogram};
use std::time::Duration;

/// Record token issuance duration and outcome
///
/// Metric: `token_issuance_duration_seconds`, `token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &'static str, duration: Duration) {
    histogram!("token_issuance_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());

    counter!("token_issuance_total", "status" => status).increment(1);
}

/// Record a validation request outcome
///
/// Metric: `token_validations_total`
/// Labels: `result`
///
/// `rejected` means the request never reached validation (bad input).
pub fn record_token_validation(result: &'static str) {
    counter!("token_validations_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // No recorder installed: calls must be no-ops rather than panics.
    #[test]
    fn test_record_without_recorder() {
        record_token_issuance("success", Duration::from_millis(3));
        record_token_issuance("error", Duration::ZERO);
        record_token_validation("valid");
        record_token_validation("rejected");
    }
}
