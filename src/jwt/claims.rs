use crate::error::TokenError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim names owned by the manager; payloads may not use them.
pub const RESERVED_CLAIMS: [&str; 2] = ["iat", "exp"];

/// Standard time claims carried by every token, in epoch seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandardClaims {
    pub iat: i64,
    pub exp: i64,
}

impl StandardClaims {
    pub fn new(issued_at: i64, ttl_seconds: i64) -> Self {
        StandardClaims {
            iat: issued_at,
            exp: issued_at + ttl_seconds,
        }
    }

    pub fn now(ttl_seconds: i64) -> Self {
        Self::new(chrono::Utc::now().timestamp(), ttl_seconds)
    }

    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        timestamp > self.exp
    }

    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        timestamp >= self.iat && !self.is_expired_at(timestamp)
    }

    /// Read the standard claims out of a decoded claim set.
    pub fn from_claim_set(claims: &Map<String, Value>) -> Result<Self, TokenError> {
        let read = |name: &str| {
            claims
                .get(name)
                .and_then(Value::as_i64)
                .ok_or_else(|| TokenError::malformed(format!("Missing or non-integer {} claim", name)))
        };

        Ok(StandardClaims {
            iat: read("iat")?,
            exp: read("exp")?,
        })
    }
}

/// Merge a caller payload with the standard claims into one flat claim set.
///
/// The payload must serialize to a JSON object that does not already use
/// any of the [`RESERVED_CLAIMS`].
pub fn seal<T: Serialize>(payload: &T, standard: StandardClaims) -> Result<Map<String, Value>, TokenError> {
    let value = serde_json::to_value(payload)
        .map_err(|e| TokenError::encoding(format!("Payload serialization failed: {}", e)))?;

    let mut claims = match value {
        Value::Object(map) => map,
        other => {
            return Err(TokenError::encoding(format!(
                "Payload must serialize to a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    if let Some(name) = RESERVED_CLAIMS.iter().find(|name| claims.contains_key(**name)) {
        return Err(TokenError::encoding(format!("Payload uses reserved claim {}", name)));
    }

    claims.insert("iat".to_string(), Value::from(standard.iat));
    claims.insert("exp".to_string(), Value::from(standard.exp));
    Ok(claims)
}

/// Strip the standard claims and map the remainder back onto `T`.
pub fn unseal<T: DeserializeOwned>(mut claims: Map<String, Value>) -> Result<T, TokenError> {
    for name in RESERVED_CLAIMS {
        claims.remove(name);
    }

    serde_json::from_value(Value::Object(claims)).map_err(|e| TokenError::decode(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
