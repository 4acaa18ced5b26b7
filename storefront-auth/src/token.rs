//! Token issuance.

use std::time::Duration;

use jsonwebtoken::encode;
use jsonwebtoken::get_current_timestamp;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Header;
use serde::Deserialize;
use serde::Serialize;

use crate::error::AuthenticationError;
use crate::keys::KeyMaterial;

/// Issued tokens are valid for two hours.
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(2 * 60 * 60);

/// The claim set carried by storefront bearer tokens.
///
/// `scope` is a space-delimited string, per RFC 6749 §3.3.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub scope: String,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

/// Signs claim sets with the provider's private key.
pub struct TokenIssuer {
    keys: KeyMaterial,
}

impl TokenIssuer {
    pub fn new(keys: KeyMaterial) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Issue an ES256 token for `sub`, expiring [`TOKEN_VALIDITY`] from now.
    pub fn issue(
        &self,
        sub: &str,
        username: &str,
        scopes: &[String],
    ) -> Result<String, AuthenticationError> {
        let now = get_current_timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            scope: scopes.join(" "),
            username: username.to_string(),
            iat: now,
            exp: now + TOKEN_VALIDITY.as_secs(),
        };
        let header = Header {
            kid: Some(self.keys.kid().to_string()),
            ..Header::new(Algorithm::ES256)
        };
        encode(&header, &claims, &self.keys.encoding_key()?)
            .map_err(AuthenticationError::CannotSignClaims)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::decode_header;

    use super::*;

    #[test]
    fn issued_token_header_names_the_signing_key() {
        let issuer = TokenIssuer::new(KeyMaterial::ephemeral());
        let token = issuer.issue("user:1", "user1", &[]).unwrap();
        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
        assert_eq!(header.kid.as_deref(), Some(issuer.keys().kid()));
    }
}
