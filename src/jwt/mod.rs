pub mod claims;
pub mod codec;
pub mod identity;

pub use claims::StandardClaims;
pub use codec::{Authenticated, JwtCodec};
pub use identity::TokenIdentity;
