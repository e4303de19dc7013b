//! Property-based tests for the token manager.
//!
//! Property 1: Payload round-trip through issue and verify
//! Property 2: Tampered signatures are always rejected as invalid
//! Property 3: Revoked tokens are rejected as revoked
//! Property 4: Refresh preserves the payload and moves expiry forward

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use session_token::{Algorithm, ManagerConfig, RefreshPolicy, TokenError, TokenManager};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    uid: i64,
    name: String,
    roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
}

const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate arbitrary session payloads.
fn arb_session() -> impl Strategy<Value = Session> {
    (
        any::<i64>(),
        ".{0,64}",
        prop::collection::vec("[a-z]{1,16}", 0..8),
        prop::option::of("[a-zA-Z0-9-]{1,32}"),
    )
        .prop_map(|(uid, name, roles, tenant)| Session {
            uid,
            name,
            roles,
            tenant,
        })
}

/// Generate one of the supported algorithms.
fn arb_algorithm() -> impl Strategy<Value = Algorithm> {
    prop_oneof![
        Just(Algorithm::HS256),
        Just(Algorithm::HS384),
        Just(Algorithm::HS512),
    ]
}

/// Generate arbitrary secrets. HMAC zero-pads short keys, so NUL bytes are
/// excluded to keep distinct secrets distinct.
fn arb_secret() -> impl Strategy<Value = Vec<u8>> {
    "[a-zA-Z0-9!@#%^&*]{1,64}".prop_map(String::into_bytes)
}

fn manager(secret: Vec<u8>, algorithm: Algorithm) -> TokenManager<Session> {
    TokenManager::new(ManagerConfig::new(secret).with_algorithm(algorithm)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: Payload Round-Trip
    ///
    /// For any payload, verifying a freshly issued token returns
    /// the same payload and the issued expiry.
    #[test]
    fn prop_issue_verify_round_trip(
        session in arb_session(),
        secret in arb_secret(),
        algorithm in arb_algorithm(),
    ) {
        let manager = manager(secret, algorithm);
        let issued = manager.issue(&session).unwrap();

        prop_assert_eq!(issued.token.split('.').count(), 3, "JWT must have 3 parts");

        let verified = manager.verify(&issued.token).unwrap();
        prop_assert_eq!(&verified.claims, &session);
        prop_assert_eq!(verified.standard.exp, issued.expires_at);
        prop_assert_eq!(verified.standard.exp - verified.standard.iat, 7200);
    }

    /// Property 2: Tampered Signature Rejection
    ///
    /// Changing any character of the signature segment yields
    /// InvalidSignature, never another kind.
    #[test]
    fn prop_tampered_signature_rejected(
        session in arb_session(),
        position in any::<prop::sample::Index>(),
        replacement in any::<prop::sample::Index>(),
    ) {
        let manager = manager(b"test-secret-key-for-property-testing-32b".to_vec(), Algorithm::HS256);
        let issued = manager.issue(&session).unwrap();

        let split = issued.token.rfind('.').unwrap() + 1;
        let mut bytes = issued.token.clone().into_bytes();
        let index = split + position.index(bytes.len() - split);
        let mut candidate = BASE64URL[replacement.index(BASE64URL.len())];
        if candidate == bytes[index] {
            candidate = if candidate == b'A' { b'B' } else { b'A' };
        }
        bytes[index] = candidate;
        let tampered = String::from_utf8(bytes).unwrap();

        prop_assert_eq!(manager.verify(&tampered).unwrap_err(), TokenError::InvalidSignature);
        prop_assert_eq!(manager.revoke(&tampered).unwrap_err(), TokenError::InvalidSignature);
    }

    /// Property 3: Revocation Is Honored
    ///
    /// After a successful revoke, verify reports Revoked while
    /// other tokens from the same manager stay valid.
    #[test]
    fn prop_revoked_token_rejected(
        session in arb_session(),
        other in arb_session(),
    ) {
        prop_assume!(session != other);

        let manager = manager(b"helloword".to_vec(), Algorithm::HS256);
        let revoked = manager.issue(&session).unwrap();
        let kept = manager.issue(&other).unwrap();

        manager.revoke(&revoked.token).unwrap();

        prop_assert_eq!(manager.verify(&revoked.token).unwrap_err(), TokenError::Revoked);
        prop_assert_eq!(manager.verify(&kept.token).unwrap().claims, other);
    }

    /// Property 4: Refresh Preserves Payload
    ///
    /// A refreshed token carries the same payload, expires strictly
    /// later, and the source token remains verifiable.
    #[test]
    fn prop_refresh_preserves_payload(
        session in arb_session(),
        algorithm in arb_algorithm(),
    ) {
        let manager = manager(b"helloword".to_vec(), algorithm);
        let issued = manager.issue(&session).unwrap();

        let refreshed = manager.refresh(&issued.token).unwrap();

        prop_assert_eq!(&refreshed.claims, &session);
        prop_assert!(refreshed.expires_at > issued.expires_at);
        prop_assert_ne!(&refreshed.token, &issued.token);
        prop_assert_eq!(manager.verify(&refreshed.token).unwrap().claims, session.clone());
        prop_assert_eq!(manager.verify(&issued.token).unwrap().claims, session);
    }

    /// Under the revoke-source policy the replacement verifies and
    /// the source is rejected as revoked.
    #[test]
    fn prop_refresh_revokes_source(
        session in arb_session(),
        algorithm in arb_algorithm(),
    ) {
        let config = ManagerConfig::new("helloword")
            .with_algorithm(algorithm)
            .with_refresh_policy(RefreshPolicy::RevokeSource);
        let manager = TokenManager::<Session>::new(config).unwrap();
        let issued = manager.issue(&session).unwrap();

        let refreshed = manager.refresh(&issued.token).unwrap();

        prop_assert!(refreshed.expires_at > issued.expires_at);
        prop_assert_eq!(manager.verify(&issued.token).unwrap_err(), TokenError::Revoked);
        prop_assert_eq!(manager.verify(&refreshed.token).unwrap().claims, session);
    }

    /// Tokens signed under one key never verify under another.
    #[test]
    fn prop_foreign_key_rejected(
        session in arb_session(),
        secret_a in arb_secret(),
        secret_b in arb_secret(),
    ) {
        prop_assume!(secret_a != secret_b);

        let issuer = manager(secret_a, Algorithm::HS256);
        let verifier = manager(secret_b, Algorithm::HS256);
        let issued = issuer.issue(&session).unwrap();

        prop_assert_eq!(verifier.verify(&issued.token).unwrap_err(), TokenError::InvalidSignature);
    }
}
