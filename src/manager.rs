//! Session token lifecycle: issue, verify, revoke, refresh.
//!
//! Tokens are stateless; the only state kept is the revocation store that
//! remembers explicitly revoked tokens for the configured retention.

use crate::config::{ManagerConfig, RefreshPolicy};
use crate::error::TokenError;
use crate::jwt::claims::{seal, unseal};
use crate::jwt::{Authenticated, JwtCodec, StandardClaims, TokenIdentity};
use crate::metrics;
use crate::revocation::{RevocationStore, RevocationSweeper, SweeperHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    /// Expiry in epoch seconds
    pub expires_at: i64,
}

/// A token that passed signature, time and revocation checks.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken<T> {
    pub claims: T,
    pub standard: StandardClaims,
    pub identity: TokenIdentity,
}

/// Result of a refresh: the replacement token and the payload it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken<T> {
    pub token: String,
    /// Expiry in epoch seconds
    pub expires_at: i64,
    pub claims: T,
}

/// Issues and checks session tokens carrying a payload of type `T`.
///
/// Safe to share across threads; wrap in an `Arc` to hand out clones.
pub struct TokenManager<T> {
    config: ManagerConfig,
    codec: JwtCodec,
    store: Arc<RevocationStore>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> TokenManager<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Build a manager from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] if the configuration is rejected.
    pub fn new(config: ManagerConfig) -> Result<Self, TokenError> {
        config.validate()?;

        let store = Arc::new(RevocationStore::new(
            config.effective_block_retention(),
            config.sweep_interval,
        ));

        info!(
            algorithm = %config.algorithm,
            max_age_secs = config.max_age.as_secs(),
            block_retention_secs = config.effective_block_retention().as_secs(),
            refresh_policy = ?config.refresh_policy,
            "Token manager initialized"
        );

        Ok(TokenManager {
            codec: JwtCodec::new(&config),
            config,
            store,
            _payload: PhantomData,
        })
    }

    /// Sign `claims` with fresh issued-at and expiry claims.
    #[instrument(skip_all)]
    pub fn issue(&self, claims: &T) -> Result<IssuedToken, TokenError> {
        self.issue_with(claims, StandardClaims::now(self.max_age_seconds()))
    }

    /// Check signature and validity window, then revocation, then decode.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<VerifiedToken<T>, TokenError> {
        let result = self.verify_inner(token);

        match &result {
            Ok(_) => metrics::record_verification("ok"),
            Err(e) => {
                metrics::record_verification(e.code());
                debug!(code = e.code(), "Session token rejected");
            }
        }
        result
    }

    /// Revoke a token so `verify` and `refresh` reject it for as long as
    /// it would otherwise be accepted, and at least the retention window.
    ///
    /// Only the signature is required to be valid. Revoking a token that
    /// is already rejected as expired succeeds without recording anything.
    #[instrument(skip_all)]
    pub fn revoke(&self, token: &str) -> Result<(), TokenError> {
        let authenticated = self.codec.verify_signature(token)?;

        let now_millis = chrono::Utc::now().timestamp_millis();
        let Some(hold) = self.acceptance_window(&authenticated.standard, now_millis) else {
            debug!(identity = %authenticated.identity, "Revoke of expired token ignored");
            return Ok(());
        };

        self.store.insert_for(authenticated.identity, Instant::now(), hold);
        metrics::TOKENS_REVOKED.inc();
        info!(
            identity = %authenticated.identity,
            hold_ms = u64::try_from(hold.as_millis()).unwrap_or(u64::MAX),
            "Session token revoked"
        );

        Ok(())
    }

    /// Issue a new token carrying the payload of a valid, unrevoked token.
    ///
    /// The replacement always expires strictly later than the source, so it
    /// never coincides with it even within the same second.
    ///
    /// Under [`RefreshPolicy::Retain`] the source token stays usable until
    /// it expires; under [`RefreshPolicy::RevokeSource`] it is revoked once
    /// the replacement has been signed.
    #[instrument(skip_all)]
    pub fn refresh(&self, token: &str) -> Result<RefreshedToken<T>, TokenError> {
        let verified = match self.verify(token) {
            Ok(verified) => verified,
            Err(e) => {
                metrics::record_refresh(e.code());
                return Err(e);
            }
        };

        let now = chrono::Utc::now().timestamp();
        let standard = StandardClaims {
            iat: now,
            exp: now
                .saturating_add(self.max_age_seconds())
                .max(verified.standard.exp.saturating_add(1)),
        };

        let issued = match self.issue_with(&verified.claims, standard) {
            Ok(issued) => issued,
            Err(e) => {
                warn!(code = e.code(), "Failed to sign refreshed token");
                metrics::record_refresh(e.code());
                return Err(e);
            }
        };

        if self.config.refresh_policy == RefreshPolicy::RevokeSource {
            let now_millis = chrono::Utc::now().timestamp_millis();
            if let Some(hold) = self.acceptance_window(&verified.standard, now_millis) {
                self.store.insert_for(verified.identity, Instant::now(), hold);
                metrics::TOKENS_REVOKED.inc();
            }
        }

        metrics::record_refresh("ok");
        info!(
            source = %verified.identity,
            expires_at = issued.expires_at,
            "Refreshed session token"
        );

        Ok(RefreshedToken {
            token: issued.token,
            expires_at: issued.expires_at,
            claims: verified.claims,
        })
    }

    /// True if the token is authentic and currently on the blocklist.
    pub fn is_revoked(&self, token: &str) -> Result<bool, TokenError> {
        let authenticated = self.codec.verify_signature(token)?;
        Ok(self.store.contains(&authenticated.identity, Instant::now()))
    }

    /// Start purging expired revocations every `sweep_interval`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        RevocationSweeper::spawn(Arc::clone(&self.store), self.config.sweep_interval)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn revocation_store(&self) -> &Arc<RevocationStore> {
        &self.store
    }

    fn issue_with(&self, claims: &T, standard: StandardClaims) -> Result<IssuedToken, TokenError> {
        let token = self.codec.sign(&seal(claims, standard)?)?;

        metrics::record_issued(self.codec.algorithm().as_str());
        debug!(expires_at = standard.exp, "Issued session token");

        Ok(IssuedToken {
            token,
            expires_at: standard.exp,
        })
    }

    /// Time from `now_millis` until the codec stops accepting a token with
    /// these claims, or `None` if it already rejects it as expired.
    ///
    /// Expiry is compared on whole seconds, so a token is accepted up to the
    /// end of second `exp + leeway`.
    fn acceptance_window(&self, standard: &StandardClaims, now_millis: i64) -> Option<Duration> {
        let leeway = i64::try_from(self.config.leeway.as_secs()).unwrap_or(i64::MAX);
        let deadline_millis = standard
            .exp
            .saturating_add(leeway)
            .saturating_add(1)
            .saturating_mul(1_000);

        u64::try_from(deadline_millis.saturating_sub(now_millis))
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    fn verify_inner(&self, token: &str) -> Result<VerifiedToken<T>, TokenError> {
        let Authenticated {
            standard,
            claims,
            identity,
        } = self.codec.verify(token)?;

        if self.store.contains(&identity, Instant::now()) {
            return Err(TokenError::Revoked);
        }

        Ok(VerifiedToken {
            claims: unseal(claims)?,
            standard,
            identity,
        })
    }

    fn max_age_seconds(&self) -> i64 {
        i64::try_from(self.config.max_age.as_secs()).unwrap_or(i64::MAX)
    }
}
