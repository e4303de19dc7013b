use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signature invalid")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token not yet valid")]
    NotYetValid,

    #[error("Token revoked")]
    Revoked,

    #[error("Token malformed: {0}")]
    Malformed(String),

    #[error("Token payload decode failure: {0}")]
    DecodeFailure(String),

    #[error("Token encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TokenError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeFailure(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Stable code suitable for responses and metric labels.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => TOKEN_INVALID_SIGNATURE,
            Self::Expired => TOKEN_EXPIRED,
            Self::NotYetValid => TOKEN_NOT_YET_VALID,
            Self::Revoked => TOKEN_REVOKED,
            Self::Malformed(_) => TOKEN_MALFORMED,
            Self::DecodeFailure(_) => TOKEN_DECODE_FAILURE,
            Self::Encoding(_) => TOKEN_ENCODING_ERROR,
            Self::ConfigError(_) => TOKEN_CONFIG_ERROR,
        }
    }

    /// True for rejections caused by the token's validity window, where
    /// re-authenticating or refreshing earlier is the appropriate response.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Expired | Self::NotYetValid)
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidAlgorithmName | ErrorKind::InvalidKeyFormat => {
                TokenError::ConfigError(err.to_string())
            }
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

// Error codes for host responses
pub const TOKEN_INVALID_SIGNATURE: &str = "TOKEN_INVALID_SIGNATURE";
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
pub const TOKEN_NOT_YET_VALID: &str = "TOKEN_NOT_YET_VALID";
pub const TOKEN_REVOKED: &str = "TOKEN_REVOKED";
pub const TOKEN_MALFORMED: &str = "TOKEN_MALFORMED";
pub const TOKEN_DECODE_FAILURE: &str = "TOKEN_DECODE_FAILURE";
pub const TOKEN_ENCODING_ERROR: &str = "TOKEN_ENCODING_ERROR";
pub const TOKEN_CONFIG_ERROR: &str = "TOKEN_CONFIG_ERROR";
