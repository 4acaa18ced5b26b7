//! Identity provider for the federated storefront.
//!
//! Issues ES256-signed bearer tokens, publishes the matching JSON Web Key Set,
//! verifies tokens against a (possibly remote) JWKS, and caches remote keysets
//! with a stale-while-error policy. Everything here is shared by the subgraph
//! services and the router coprocessor.

mod error;
mod jwks;
mod keys;
mod token;
mod verify;
mod well_known;

pub use error::AuthenticationError;
pub use error::JwksError;
pub use jwks::JwksCache;
pub use jwks::DEFAULT_JWKS_TTL;
pub use keys::KeyMaterial;
pub use token::Claims;
pub use token::TokenIssuer;
pub use token::TOKEN_VALIDITY;
pub use verify::bearer_token;
pub use verify::verify;
pub use verify::IdentityContext;
pub use well_known::jwks_router;
pub use well_known::WELL_KNOWN_JWKS_PATH;
