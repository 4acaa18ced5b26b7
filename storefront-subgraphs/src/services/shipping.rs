//! The shipping subgraph: extends `Order` with a computed shipping cost.
//!
//! The order's item weights and the buyer's address arrive in the
//! representation (the router gathers them from the owning subgraphs before
//! dispatching here); this service holds no data of its own.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;

use crate::error::ResolverError;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;

/// The slice of an Order representation this service reads.
#[derive(Debug, Default, Deserialize)]
struct OrderShippingView {
    #[serde(default)]
    items: Vec<ItemView>,
    #[serde(default)]
    buyer: BuyerView,
}

#[derive(Debug, Deserialize)]
struct ItemView {
    #[serde(default)]
    weight: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyerView {
    #[serde(default)]
    shipping_address: Option<String>,
}

pub struct ShippingService;

impl ShippingService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }

    /// Simulate quoting a carrier: weight times a rate derived from the
    /// address, plus some noise.
    pub fn shipping_cost(&self, weights: &[f64], address: &str) -> f64 {
        let base: f64 = weights
            .iter()
            .map(|weight| weight * address.len() as f64)
            .sum();
        base + f64::from(rand::rng().random_range(0..10))
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new().with(Arc::new(OrderReference {
            service: self.clone(),
        }))
    }
}

struct OrderReference {
    service: Arc<ShippingService>,
}

#[async_trait]
impl EntityResolver for OrderReference {
    fn type_name(&self) -> &'static str {
        "Order"
    }

    fn key_fields(&self) -> &'static [&'static str] {
        &["id"]
    }

    async fn resolve_reference(
        &self,
        reference: &Representation,
    ) -> Result<Option<Value>, ResolverError> {
        let id = reference.key_str("id")?;
        let view: OrderShippingView =
            serde_json::from_value(Value::Object(reference.fields.clone()))?;

        // without the required weights and address there is no quote to give
        let cost = match view.buyer.shipping_address {
            Some(address) if !view.items.is_empty() => {
                let weights: Vec<f64> = view.items.iter().filter_map(|i| i.weight).collect();
                Some(self.service.shipping_cost(&weights, &address))
            }
            _ => None,
        };

        Ok(Some(json!({
            "__typename": "Order",
            "id": id,
            "shippingCost": cost,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_scales_with_weight_and_address_length() {
        let service = ShippingService::new();
        let address = "123 Main St"; // 11 characters
        let cost = service.shipping_cost(&[0.5, 0.55], address);
        let base = (0.5 + 0.55) * 11.0;
        assert!(cost >= base && cost < base + 10.0, "cost {cost} out of range");
    }

    #[tokio::test]
    async fn order_reference_with_requirements_gets_a_quote() {
        let service = ShippingService::new();
        let entities = service
            .registry()
            .resolve_representations(&[serde_json::json!({
                "__typename": "Order",
                "id": "order:1",
                "items": [{ "id": "variant:1", "weight": 0.5 }],
                "buyer": { "shippingAddress": "123 Main St" },
            })])
            .await
            .unwrap();
        let order = entities[0].as_ref().unwrap();
        assert!(order["shippingCost"].as_f64().unwrap() >= 0.5 * 11.0);
    }

    #[tokio::test]
    async fn order_reference_without_requirements_has_no_quote() {
        let service = ShippingService::new();
        let entities = service
            .registry()
            .resolve_representations(&[serde_json::json!({
                "__typename": "Order",
                "id": "order:1",
            })])
            .await
            .unwrap();
        assert!(entities[0].as_ref().unwrap()["shippingCost"].is_null());
    }
}
