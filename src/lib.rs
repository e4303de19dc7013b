//! Session token library.
//!
//! Issues, verifies, revokes and refreshes stateless HMAC-signed session
//! tokens carrying a caller-defined payload, backed by an expiring
//! in-memory blocklist of revoked tokens.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod jwt;
pub mod manager;
pub mod metrics;
pub mod revocation;
pub mod telemetry;

// Re-exports for convenience
pub use config::{Algorithm, ManagerConfig, RefreshPolicy};
pub use error::TokenError;
pub use jwt::{StandardClaims, TokenIdentity};
pub use manager::{IssuedToken, RefreshedToken, TokenManager, VerifiedToken};
pub use revocation::{RevocationStore, SweeperHandle};
