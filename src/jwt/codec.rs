//! Adapter over `jsonwebtoken`, the signing primitive.
//!
//! Produces and checks compact three-segment HMAC tokens. Signature checks
//! always run before any claim is looked at.

use crate::config::{Algorithm, ManagerConfig};
use crate::error::TokenError;
use crate::jwt::claims::StandardClaims;
use crate::jwt::identity::TokenIdentity;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

/// A token whose signature has been checked against the configured key.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub standard: StandardClaims,
    pub claims: Map<String, Value>,
    pub identity: TokenIdentity,
}

pub struct JwtCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    leeway_seconds: u64,
}

impl JwtCodec {
    pub fn new(config: &ManagerConfig) -> Self {
        let secret = config.secret_key();
        JwtCodec {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            leeway_seconds: config.leeway.as_secs(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn sign(&self, claims: &Map<String, Value>) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm.to_jwt());
        encode(&header, claims, &self.encoding_key).map_err(|e| TokenError::encoding(e.to_string()))
    }

    /// Check signature, expiry and issued-at against the current time.
    pub fn verify(&self, token: &str) -> Result<Authenticated, TokenError> {
        let authenticated = self.decode_with(token, true)?;

        let now = chrono::Utc::now().timestamp();
        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);
        if authenticated.standard.iat > now.saturating_add(leeway) {
            return Err(TokenError::NotYetValid);
        }

        Ok(authenticated)
    }

    /// Check the signature only; time claims are read but not enforced.
    pub fn verify_signature(&self, token: &str) -> Result<Authenticated, TokenError> {
        self.decode_with(token, false)
    }

    fn decode_with(&self, token: &str, validate_exp: bool) -> Result<Authenticated, TokenError> {
        let mut validation = Validation::new(self.algorithm.to_jwt());
        validation.validate_exp = validate_exp;
        validation.validate_nbf = false;
        // Payloads may carry their own `aud`; audience is not ours to enforce.
        validation.validate_aud = false;
        validation.leeway = self.leeway_seconds;
        if !validate_exp {
            validation.required_spec_claims.clear();
        }

        let token_data = decode::<Map<String, Value>>(token, &self.decoding_key, &validation)?;
        let standard = StandardClaims::from_claim_set(&token_data.claims)?;

        Ok(Authenticated {
            standard,
            claims: token_data.claims,
            identity: TokenIdentity::from_token(token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims::seal;
    use serde_json::json;

    fn codec(secret: &str, algorithm: Algorithm) -> JwtCodec {
        JwtCodec::new(&ManagerConfig::new(secret).with_algorithm(algorithm))
    }

    fn sealed(ttl: i64) -> Map<String, Value> {
        seal(&json!({ "uid": 1 }), StandardClaims::now(ttl)).unwrap()
    }

    #[test]
    fn test_round_trip_each_algorithm() {
        for algorithm in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
            let codec = codec("test-secret-key-for-testing-only", algorithm);
            let token = codec.sign(&sealed(60)).unwrap();

            assert_eq!(token.split('.').count(), 3);
            let authenticated = codec.verify(&token).unwrap();
            assert_eq!(authenticated.claims["uid"], 1);
            assert_eq!(authenticated.identity, TokenIdentity::from_token(&token));
        }
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let token = codec("key-one", Algorithm::HS256).sign(&sealed(60)).unwrap();
        let result = codec("key-two", Algorithm::HS256).verify(&token);
        assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn test_algorithm_mismatch_is_invalid_signature() {
        let token = codec("key", Algorithm::HS512).sign(&sealed(60)).unwrap();
        let result = codec("key", Algorithm::HS256).verify(&token);
        assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn test_expired_token() {
        let codec = codec("key", Algorithm::HS256);
        let claims = seal(&json!({}), StandardClaims::new(1_000, 60)).unwrap();
        let token = codec.sign(&claims).unwrap();

        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::Expired);
        let authenticated = codec.verify_signature(&token).unwrap();
        assert_eq!(authenticated.standard.exp, 1_060);
    }

    #[test]
    fn test_future_issued_at_is_not_yet_valid() {
        let codec = codec("key", Algorithm::HS256);
        let later = chrono::Utc::now().timestamp() + 3_600;
        let claims = seal(&json!({}), StandardClaims::new(later, 60)).unwrap();
        let token = codec.sign(&claims).unwrap();

        assert_eq!(codec.verify(&token).unwrap_err(), TokenError::NotYetValid);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec("key", Algorithm::HS256);
        assert!(matches!(codec.verify("not-a-token"), Err(TokenError::Malformed(_))));
    }
}
