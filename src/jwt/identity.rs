use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use std::fmt;

/// Payload-independent fingerprint of a token, used as the revocation key.
///
/// Derived from the signature segment only, so it is fixed-size no matter
/// how large the payload is. Only derive it from tokens whose signature
/// has been verified.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenIdentity([u8; 32]);

impl TokenIdentity {
    /// Fingerprint a compact JWT by hashing its signature segment.
    pub fn from_token(token: &str) -> Self {
        let signature = token.rsplit('.').next().unwrap_or(token);
        Self::from_signature(signature)
    }

    pub fn from_signature(signature: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(signature.as_bytes());
        TokenIdentity(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TokenIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for TokenIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenIdentity({})", self)
    }
}
