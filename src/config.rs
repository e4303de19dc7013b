//! Token manager configuration.
//!
//! Configuration is fixed when the manager is constructed. It can be built
//! in code or loaded from environment variables, and is validated before a
//! manager is ever handed out.

use crate::error::TokenError;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use zeroize::Zeroizing;

/// Default token validity.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(2 * 60 * 60);

/// Default interval between revocation store purges.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// HMAC signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// HMAC with SHA-256
    #[default]
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
}

impl Algorithm {
    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }

    pub(crate) const fn to_jwt(self) -> jsonwebtoken::Algorithm {
        match self {
            Self::HS256 => jsonwebtoken::Algorithm::HS256,
            Self::HS384 => jsonwebtoken::Algorithm::HS384,
            Self::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }
}

impl FromStr for Algorithm {
    type Err = TokenError;

    /// Parse algorithm from string. An empty name selects the default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" | "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            _ => Err(TokenError::config(format!("Unsupported JWT algorithm: {}", s))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `refresh` does with the token it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// The source token stays valid until it expires. Concurrent refreshes
    /// of the same token all succeed.
    #[default]
    Retain,
    /// The source token is revoked once the new token has been issued.
    RevokeSource,
}

impl FromStr for RefreshPolicy {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "retain" => Ok(Self::Retain),
            "revoke" | "revoke_source" | "revoke-source" => Ok(Self::RevokeSource),
            _ => Err(TokenError::config(format!("Invalid refresh policy: {}", s))),
        }
    }
}

/// Token manager configuration.
#[derive(Clone)]
pub struct ManagerConfig {
    secret_key: Zeroizing<Vec<u8>>,
    /// Signing algorithm
    pub algorithm: Algorithm,
    /// Validity of issued tokens
    pub max_age: Duration,
    /// How long a revocation is remembered. `None` follows `max_age`
    /// plus `leeway`.
    pub block_retention: Option<Duration>,
    /// Clock skew tolerated on `exp` and `iat`
    pub leeway: Duration,
    /// Minimum time between purges of expired revocations
    pub sweep_interval: Duration,
    /// Behavior of `refresh` towards the source token
    pub refresh_policy: RefreshPolicy,
}

impl ManagerConfig {
    /// Create a configuration with defaults for everything except the key.
    pub fn new(secret_key: impl Into<Vec<u8>>) -> Self {
        Self {
            secret_key: Zeroizing::new(secret_key.into()),
            algorithm: Algorithm::default(),
            max_age: DEFAULT_MAX_AGE,
            block_retention: None,
            leeway: Duration::ZERO,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            refresh_policy: RefreshPolicy::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SESSION_TOKEN_SECRET` is missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let secret = env::var("SESSION_TOKEN_SECRET")
            .map_err(|_| TokenError::config("SESSION_TOKEN_SECRET is not set"))?;
        let algorithm: Algorithm = env::var("SESSION_TOKEN_ALGORITHM")
            .unwrap_or_default()
            .parse()?;
        let refresh_policy: RefreshPolicy = env::var("SESSION_TOKEN_REFRESH_POLICY")
            .unwrap_or_default()
            .parse()?;

        let max_age = Duration::from_secs(parse_env(
            "SESSION_TOKEN_MAX_AGE_SECS",
            DEFAULT_MAX_AGE.as_secs(),
        )?);
        let block_retention = match env::var("SESSION_TOKEN_BLOCK_RETENTION_SECS") {
            Ok(_) => Some(Duration::from_secs(parse_env(
                "SESSION_TOKEN_BLOCK_RETENTION_SECS",
                0,
            )?)),
            Err(_) => None,
        };
        let leeway = Duration::from_secs(parse_env("SESSION_TOKEN_LEEWAY_SECS", 0)?);
        let sweep_interval = Duration::from_secs(parse_env(
            "SESSION_TOKEN_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL.as_secs(),
        )?);

        Ok(Self {
            secret_key: Zeroizing::new(secret.into_bytes()),
            algorithm,
            max_age,
            block_retention,
            leeway,
            sweep_interval,
            refresh_policy,
        })
    }

    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub const fn with_block_retention(mut self, retention: Duration) -> Self {
        self.block_retention = Some(retention);
        self
    }

    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    pub(crate) fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }

    /// Retention actually applied to revocations.
    #[must_use]
    pub fn effective_block_retention(&self) -> Duration {
        self.block_retention.unwrap_or_else(|| self.max_age.saturating_add(self.leeway))
    }

    /// Check the configuration before a manager is built from it.
    ///
    /// A revocation must outlive the token it revokes, so a retention
    /// shorter than `max_age + leeway` is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] describing the first violation.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.secret_key.is_empty() {
            return Err(TokenError::config("Secret key must not be empty"));
        }
        if self.max_age.as_secs() == 0 {
            return Err(TokenError::config("max_age must be at least one second"));
        }
        if self.leeway >= self.max_age {
            return Err(TokenError::config("leeway must be shorter than max_age"));
        }
        if self.sweep_interval.is_zero() {
            return Err(TokenError::config("sweep_interval must be non-zero"));
        }

        let retention = self.effective_block_retention();
        if retention < self.max_age.saturating_add(self.leeway) {
            return Err(TokenError::config(format!(
                "block_retention ({}s) must be >= max_age + leeway ({}s + {}s)",
                retention.as_secs(),
                self.max_age.as_secs(),
                self.leeway.as_secs()
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("secret_key", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("max_age", &self.max_age)
            .field("block_retention", &self.block_retention)
            .field("leeway", &self.leeway)
            .field("sweep_interval", &self.sweep_interval)
            .field("refresh_policy", &self.refresh_policy)
            .finish()
    }
}

/// Parse environment variable with default value.
fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
