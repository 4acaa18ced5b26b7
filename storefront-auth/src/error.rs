use displaydoc::Display;
use jsonwebtoken::errors::Error as JWTError;
use thiserror::Error;

/// Token verification and issuance failures.
///
/// Verification failures are "no identity", not fatal: callers decide whether
/// the operation at hand requires authentication.
#[derive(Debug, Display, Error)]
pub enum AuthenticationError {
    /// malformed authorization header: {0}
    MalformedHeader(String),

    /// token is not a valid JWT: {0}
    MalformedToken(JWTError),

    /// JWT is expired
    TokenExpired,

    /// JWT signature could not be verified: {0}
    SignatureMismatch(JWTError),

    /// cannot find kid: '{0:?}' in JWKS
    KeyNotFound(Option<String>),

    /// cannot create decoding key: {0}
    CannotCreateDecodingKey(JWTError),

    /// cannot sign claims: {0}
    CannotSignClaims(JWTError),

    /// key material is not usable: {0}
    BadKeyMaterial(String),
}

impl AuthenticationError {
    /// True for the failures that mean "treat the caller as unauthenticated",
    /// as opposed to a broken verification subsystem.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthenticationError::MalformedHeader(_)
                | AuthenticationError::MalformedToken(_)
                | AuthenticationError::TokenExpired
                | AuthenticationError::SignatureMismatch(_)
                | AuthenticationError::KeyNotFound(_)
        )
    }
}

/// JWKS retrieval failures.
#[derive(Debug, Display, Error)]
pub enum JwksError {
    /// failed to fetch JWKS from '{url}': {source}
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// JWKS endpoint '{url}' returned a malformed keyset: {source}
    MalformedKeySet {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
