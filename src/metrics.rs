//! Prometheus metrics for session tokens.
//!
//! Registered in the default registry on first use.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_counter, register_int_gauge, CounterVec, IntCounter, IntGauge};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_token_tokens_issued_total",
        "Total number of session tokens issued",
        &["algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Verification outcomes counter.
pub static TOKEN_VERIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_token_verifications_total",
        "Total number of session token verifications",
        &["outcome"]
    )
    .expect("Failed to register verifications metric")
});

/// Tokens revoked counter.
pub static TOKENS_REVOKED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "session_token_tokens_revoked_total",
        "Total number of session tokens revoked"
    )
    .expect("Failed to register tokens_revoked metric")
});

/// Tokens refreshed counter.
pub static TOKENS_REFRESHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_token_tokens_refreshed_total",
        "Total number of session token refreshes",
        &["status"]
    )
    .expect("Failed to register tokens_refreshed metric")
});

/// Revocation entries evicted after their retention window.
pub static REVOCATIONS_PURGED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "session_token_revocations_purged_total",
        "Total number of expired revocation entries purged"
    )
    .expect("Failed to register revocations_purged metric")
});

/// Current revocation entries across all stores.
pub static REVOCATION_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "session_token_revocation_entries",
        "Current number of revocation entries held in memory"
    )
    .expect("Failed to register revocation_entries metric")
});

/// Record a successful issue.
pub fn record_issued(algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[algorithm]).inc();
}

/// Record a verification result; `outcome` is `"ok"` or an error code.
pub fn record_verification(outcome: &str) {
    TOKEN_VERIFICATIONS.with_label_values(&[outcome]).inc();
}

/// Record a refresh result.
pub fn record_refresh(status: &str) {
    TOKENS_REFRESHED.with_label_values(&[status]).inc();
}
