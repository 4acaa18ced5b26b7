//! The users subgraph: identity records, login, and per-field authorization.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use storefront_auth::IdentityContext;
use storefront_auth::TokenIssuer;
use uuid::Uuid;

use crate::error::ResolverError;
use crate::federation::entity_stub;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;
use crate::store::UserRecord;
use crate::store::UserStore;

/// Scope granting read access to any user's email address.
pub const USER_READ_EMAIL_SCOPE: &str = "user:read:email";

/// Login outcome; the response union is discriminated by the presence of
/// `reason`.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum LoginResponse {
    Successful(LoginSuccessful),
    Failed(LoginFailed),
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LoginSuccessful {
    pub token: String,
    pub scopes: Vec<String>,
    pub user: Value,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LoginFailed {
    pub reason: String,
}

pub struct UsersService {
    store: Arc<dyn UserStore>,
    issuer: Arc<TokenIssuer>,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>, issuer: Arc<TokenIssuer>) -> Arc<Self> {
        Arc::new(Self { store, issuer })
    }

    /// `Query.user`. Unlike reference resolution, an unknown id here is a
    /// caller error.
    ///
    /// `email` is withheld when an authenticated caller is neither the user
    /// themselves nor a holder of [`USER_READ_EMAIL_SCOPE`]; this is
    /// per-field redaction, not a blanket access-denied.
    pub async fn user(
        &self,
        id: &str,
        identity: Option<&IdentityContext>,
    ) -> Result<Value, ResolverError> {
        let record = self
            .store
            .user(id)
            .await?
            .ok_or_else(|| ResolverError::NotFound("Could not locate user by provided id".to_string()))?;

        let mut user = user_value(&record);
        if let Some(identity) = identity {
            if identity.sub != record.id && !identity.has_scope(USER_READ_EMAIL_SCOPE) {
                if let Some(object) = user.as_object_mut() {
                    object.remove("email");
                }
            }
        }
        Ok(user)
    }

    /// `Query.me`: the caller's own record, or null when unauthenticated.
    pub async fn me(
        &self,
        identity: Option<&IdentityContext>,
    ) -> Result<Option<Value>, ResolverError> {
        let Some(identity) = identity else {
            return Ok(None);
        };
        Ok(self.store.user(&identity.sub).await?.map(|r| user_value(&r)))
    }

    /// `Mutation.login`.
    ///
    /// Mock trust model: any non-empty password is accepted for a known
    /// username, and an empty password is indistinguishable from an unknown
    /// user. A real deployment swaps the store for a credential store with
    /// hashing and rate limiting.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        scopes: Vec<String>,
    ) -> Result<LoginResponse, ResolverError> {
        let user = self.store.user_by_username(username).await?;
        let Some(user) = user.filter(|_| !password.is_empty()) else {
            return Ok(LoginResponse::Failed(LoginFailed {
                reason: "user not found".to_string(),
            }));
        };

        let token = self
            .issuer
            .issue(&user.id, &user.username, &scopes)
            .map_err(|e| ResolverError::InvalidArgument(e.to_string()))?;
        Ok(LoginResponse::Successful(LoginSuccessful {
            token,
            scopes,
            user: user_value(&user),
        }))
    }

    /// `User.previousSessions`: mock session ids.
    pub fn previous_sessions(&self) -> Vec<String> {
        vec![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()]
    }

    /// `User.loyaltyPoints`: mock balance.
    pub fn loyalty_points(&self) -> u32 {
        rand::rng().random_range(0..20)
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new().with(Arc::new(UserReference {
            service: self.clone(),
        }))
    }
}

fn user_value(record: &UserRecord) -> Value {
    json!({
        "__typename": "User",
        "id": record.id,
        "username": record.username,
        "email": record.email,
        "shippingAddress": record.shipping_address,
        "paymentMethods": record.payment_methods,
        "orders": record
            .order_ids
            .iter()
            .map(|id| entity_stub("Order", id))
            .collect::<Vec<_>>(),
    })
}

struct UserReference {
    service: Arc<UsersService>,
}

#[async_trait]
impl EntityResolver for UserReference {
    fn type_name(&self) -> &'static str {
        "User"
    }

    fn key_fields(&self) -> &'static [&'static str] {
        &["id"]
    }

    async fn resolve_reference(
        &self,
        reference: &Representation,
    ) -> Result<Option<Value>, ResolverError> {
        let id = reference.key_str("id")?;
        Ok(self.service.store.user(id).await?.map(|r| user_value(&r)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use storefront_auth::verify;
    use storefront_auth::KeyMaterial;

    use super::*;
    use crate::store::InMemoryUsers;

    fn service() -> Arc<UsersService> {
        UsersService::new(
            Arc::new(InMemoryUsers::seeded()),
            Arc::new(TokenIssuer::new(KeyMaterial::ephemeral())),
        )
    }

    fn identity(sub: &str, scopes: &[&str]) -> IdentityContext {
        IdentityContext {
            sub: sub.to_string(),
            username: sub.replace("user:", "user"),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_token() {
        let service = service();
        let response = service
            .login("user1", "pw", vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        let LoginResponse::Successful(success) = response else {
            panic!("expected LoginSuccessful");
        };
        assert_eq!(success.user["id"], "user:1");

        let jwks = service.issuer.keys().jwks();
        let identity = verify(&success.token, &jwks).unwrap();
        assert_eq!(identity.sub, "user:1");
        assert_eq!(
            identity.scopes,
            HashSet::from(["a".to_string(), "b".to_string()])
        );
    }

    #[tokio::test]
    async fn empty_password_is_indistinguishable_from_unknown_user() {
        let service = service();
        for (username, password) in [("user1", ""), ("nobody", "pw")] {
            let response = service.login(username, password, vec![]).await.unwrap();
            assert_eq!(
                response,
                LoginResponse::Failed(LoginFailed {
                    reason: "user not found".to_string(),
                })
            );
        }
    }

    #[tokio::test]
    async fn email_is_redacted_for_other_users_without_the_read_scope() {
        let service = service();
        let caller = identity("user:2", &[]);
        let user = service.user("user:1", Some(&caller)).await.unwrap();
        assert!(user.get("email").is_none());
        // everything else is still there
        assert_eq!(user["username"], "user1");
    }

    #[tokio::test]
    async fn email_is_visible_to_self_and_scope_holders() {
        let service = service();

        let me = identity("user:1", &[]);
        let user = service.user("user:1", Some(&me)).await.unwrap();
        assert_eq!(user["email"], "user1@contoso.org");

        let support = identity("user:3", &[USER_READ_EMAIL_SCOPE]);
        let user = service.user("user:1", Some(&support)).await.unwrap();
        assert_eq!(user["email"], "user1@contoso.org");
    }

    #[tokio::test]
    async fn unknown_user_is_a_graphql_error() {
        let err = service().user("user:404", None).await.unwrap_err();
        assert!(matches!(err, ResolverError::NotFound(_)));
        assert_eq!(
            err.to_graphql().message,
            "Could not locate user by provided id"
        );
    }

    #[tokio::test]
    async fn me_requires_an_identity() {
        let service = service();
        assert!(service.me(None).await.unwrap().is_none());

        let caller = identity("user:2", &[]);
        let me = service.me(Some(&caller)).await.unwrap().unwrap();
        assert_eq!(me["id"], "user:2");
    }

    #[tokio::test]
    async fn user_reference_resolution_returns_the_full_local_record() {
        let entities = service()
            .registry()
            .resolve_representations(&[json!({ "__typename": "User", "id": "user:3" })])
            .await
            .unwrap();
        let user = entities[0].as_ref().unwrap();
        assert_eq!(user["paymentMethods"].as_array().unwrap().len(), 2);
        assert_eq!(user["paymentMethods"][1]["type"], "BANK_ACCOUNT");
    }
}
