//! Per-request identity context for the subgraph services.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use jsonwebtoken::jwk::JwkSet;
use storefront_auth::bearer_token;
use storefront_auth::verify;
use storefront_auth::IdentityContext;

/// Demo fallback header used by some flows when no bearer token is present.
pub const USER_ID_HEADER: &str = "x-user-id";

/// What a subgraph knows about its caller.
///
/// Built once per request from the incoming headers. A missing or failed
/// identity is not an error; field resolvers decide what requires one.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub identity: Option<IdentityContext>,
    pub fallback_user_id: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: IdentityContext) -> Self {
        Self {
            identity: Some(identity),
            fallback_user_id: None,
        }
    }

    /// Derive the caller's identity from request headers.
    ///
    /// Expired or malformed tokens downgrade to anonymous; those are routine.
    /// Anything else from the verifier is a subsystem fault and gets logged
    /// before downgrading.
    pub fn from_headers(headers: &HeaderMap, keys: &JwkSet) -> Self {
        let identity = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .and_then(|token| match verify(token, keys) {
                Ok(identity) => Some(identity),
                Err(e) if e.is_unauthenticated() => {
                    tracing::debug!(error = %e, "bearer token rejected, continuing unauthenticated");
                    None
                }
                Err(e) => {
                    tracing::error!(error = %e, "token verification subsystem error");
                    None
                }
            });
        let fallback_user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self {
            identity,
            fallback_user_id,
        }
    }

    /// The effective user id: a verified subject wins over the demo header.
    pub fn user_id(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .map(|identity| identity.sub.as_str())
            .or(self.fallback_user_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;
    use storefront_auth::KeyMaterial;
    use storefront_auth::TokenIssuer;

    use super::*;

    #[test]
    fn verified_token_produces_an_identity() {
        let issuer = TokenIssuer::new(KeyMaterial::ephemeral());
        let token = issuer
            .issue("user:1", "user1", &["user:read:email".to_string()])
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let context = RequestContext::from_headers(&headers, &issuer.keys().jwks());
        let identity = context.identity.as_ref().expect("identity");
        assert_eq!(identity.sub, "user:1");
        assert!(identity.has_scope("user:read:email"));
        assert_eq!(context.user_id(), Some("user:1"));
    }

    #[test]
    fn garbage_token_downgrades_to_anonymous() {
        let keys = KeyMaterial::ephemeral();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"));

        let context = RequestContext::from_headers(&headers, &keys.jwks());
        assert!(context.identity.is_none());
        assert_eq!(context.user_id(), None);
    }

    #[test]
    fn user_id_header_is_a_fallback_only() {
        let issuer = TokenIssuer::new(KeyMaterial::ephemeral());
        let token = issuer.issue("user:1", "user1", &[]).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user:2"));

        let context = RequestContext::from_headers(&headers, &issuer.keys().jwks());
        assert_eq!(context.user_id(), Some("user:2"));

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let context = RequestContext::from_headers(&headers, &issuer.keys().jwks());
        assert_eq!(context.user_id(), Some("user:1"));
    }
}
