//! The checkout subgraph: cart sessions and the purchase mutations.
//!
//! Mutations here are local, in-memory, and non-atomic across subgraphs:
//! checkout empties the cart and mints an order id without touching the
//! orders or inventory services. Callers must treat the whole flow as
//! best-effort and eventually consistent.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ResolverError;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;
use crate::store::Cart;
use crate::store::CartStore;

/// Mutation outcome with a human-readable message.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ResultWithMessage {
    pub successful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub successful: bool,
    #[serde(rename = "orderID", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

pub struct CheckoutService {
    store: Arc<dyn CartStore>,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn CartStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    /// `User.cart`; a user without an active session has no cart.
    pub async fn user_cart(&self, user_id: &str) -> Result<Option<Value>, ResolverError> {
        Ok(self
            .store
            .cart(user_id)
            .await?
            .map(|cart| cart_value(user_id, &cart)))
    }

    pub async fn add_variant_to_cart(
        &self,
        user_id: &str,
        variant_id: &str,
        quantity: Option<u32>,
    ) -> Result<ResultWithMessage, ResolverError> {
        let quantity = quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(ResolverError::InvalidArgument(
                "quantity must be at least 1".to_string(),
            ));
        }
        self.store.add_item(user_id, variant_id, quantity).await?;
        Ok(ResultWithMessage {
            successful: true,
            message: Some("Added variant to cart".to_string()),
        })
    }

    pub async fn remove_variant_from_cart(
        &self,
        user_id: &str,
        variant_id: &str,
    ) -> Result<ResultWithMessage, ResolverError> {
        let removed = self.store.remove_item(user_id, variant_id).await?;
        Ok(if removed {
            ResultWithMessage {
                successful: true,
                message: Some("Removed variant from cart".to_string()),
            }
        } else {
            ResultWithMessage {
                successful: false,
                message: Some("Variant not in cart".to_string()),
            }
        })
    }

    pub async fn checkout(
        &self,
        user_id: &str,
        payment_method_id: &str,
    ) -> Result<CheckoutResult, ResolverError> {
        if payment_method_id.is_empty() {
            return Err(ResolverError::InvalidArgument(
                "paymentMethodId is required".to_string(),
            ));
        }
        let cart = self.store.take_cart(user_id).await?;
        match cart {
            Some(cart) if !cart.items.is_empty() => Ok(CheckoutResult {
                successful: true,
                order_id: Some(format!("order:{}", Uuid::new_v4().simple())),
            }),
            _ => Ok(CheckoutResult {
                successful: false,
                order_id: None,
            }),
        }
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new().with(Arc::new(UserReference {
            service: self.clone(),
        }))
    }
}

fn cart_value(user_id: &str, cart: &Cart) -> Value {
    json!({
        "__typename": "Cart",
        "userId": user_id,
        "items": cart
            .items
            .iter()
            .map(|item| json!({
                "__typename": "Variant",
                "id": item.variant_id,
                "price": item.price,
            }))
            .collect::<Vec<_>>(),
        "subtotal": cart.subtotal(),
    })
}

struct UserReference {
    service: Arc<CheckoutService>,
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
        Ok(Some(json!({
            "__typename": "User",
            "id": id,
            "cart": self.service.user_cart(id).await?,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCarts;

    fn service() -> Arc<CheckoutService> {
        CheckoutService::new(Arc::new(InMemoryCarts::seeded()))
    }

    #[tokio::test]
    async fn cart_subtotal_is_the_sum_of_item_prices() {
        let cart = service().user_cart("user:1").await.unwrap().unwrap();
        assert_eq!(cart["subtotal"], 1200.5);
        assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn add_then_remove_round_trips() {
        let service = service();
        let added = service
            .add_variant_to_cart("user:2", "variant:6", None)
            .await
            .unwrap();
        assert!(added.successful);

        let cart = service.user_cart("user:2").await.unwrap().unwrap();
        assert_eq!(cart["items"].as_array().unwrap().len(), 2);
        assert_eq!(cart["subtotal"], 600.25 + 25.5);

        let removed = service
            .remove_variant_from_cart("user:2", "variant:6")
            .await
            .unwrap();
        assert!(removed.successful);

        let missing = service
            .remove_variant_from_cart("user:2", "variant:6")
            .await
            .unwrap();
        assert!(!missing.successful);
    }

    #[tokio::test]
    async fn zero_quantity_is_a_validation_error() {
        let err = service()
            .add_variant_to_cart("user:2", "variant:6", Some(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn checkout_empties_the_cart_and_mints_an_order_id() {
        let service = service();
        let result = service.checkout("user:1", "paymentMethod:1").await.unwrap();
        assert!(result.successful);
        assert!(result.order_id.unwrap().starts_with("order:"));

        // the session is gone; and a second checkout has nothing to buy
        assert!(service.user_cart("user:1").await.unwrap().is_none());
        let again = service.checkout("user:1", "paymentMethod:1").await.unwrap();
        assert!(!again.successful);
    }

    #[tokio::test]
    async fn user_reference_carries_the_cart() {
        let entities = service()
            .registry()
            .resolve_representations(&[
                json!({ "__typename": "User", "id": "user:2" }),
                json!({ "__typename": "User", "id": "user:3" }),
            ])
            .await
            .unwrap();
        assert_eq!(entities[0].as_ref().unwrap()["cart"]["subtotal"], 600.25);
        // user:3 has no active session
        assert!(entities[1].as_ref().unwrap()["cart"].is_null());
    }
}
