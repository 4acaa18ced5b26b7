//! Bearer token verification against a JWKS.

use std::collections::HashSet;

use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::jwk::EllipticCurve;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::jwk::KeyAlgorithm;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;

use crate::error::AuthenticationError;
use crate::token::Claims;

/// The identity derived from a verified bearer token.
///
/// Absence of an identity is not an error; callers decide whether the field
/// or operation at hand requires authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityContext {
    pub sub: String,
    pub username: String,
    pub scopes: HashSet<String>,
}

impl IdentityContext {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

impl From<Claims> for IdentityContext {
    fn from(claims: Claims) -> Self {
        IdentityContext {
            sub: claims.sub,
            username: claims.username,
            scopes: claims
                .scope
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme comparison is case-insensitive and surrounding whitespace is
/// accepted, matching what clients actually send.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    let (scheme, rest) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

/// Verify `token` against `keys` and produce the caller's identity.
pub fn verify(token: &str, keys: &JwkSet) -> Result<IdentityContext, AuthenticationError> {
    let header = decode_header(token).map_err(AuthenticationError::MalformedToken)?;

    let jwk = find_key(keys, header.kid.as_deref(), header.alg)
        .ok_or_else(|| AuthenticationError::KeyNotFound(header.kid.clone()))?;
    let decoding_key =
        DecodingKey::from_jwk(jwk).map_err(AuthenticationError::CannotCreateDecodingKey)?;

    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_nbf = true;
    // we don't validate audience, so don't reject tokens carrying an `aud` claim
    validation.validate_aud = false;

    let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthenticationError::TokenExpired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            AuthenticationError::SignatureMismatch(e)
        }
        _ => AuthenticationError::MalformedToken(e),
    })?;

    Ok(data.claims.into())
}

/// Pick a verification key: an exact kid match wins, otherwise any P-256
/// signature key compatible with the token's algorithm.
fn find_key<'a>(keys: &'a JwkSet, kid: Option<&str>, alg: Algorithm) -> Option<&'a Jwk> {
    if let Some(kid) = kid {
        if let Some(jwk) = keys.find(kid) {
            return Some(jwk);
        }
    }
    if alg != Algorithm::ES256 {
        return None;
    }
    keys.keys.iter().find(|jwk| {
        matches!(jwk.common.key_algorithm, Some(KeyAlgorithm::ES256))
            || matches!(
                &jwk.algorithm,
                AlgorithmParameters::EllipticCurve(params) if params.curve == EllipticCurve::P256
            )
    })
}
