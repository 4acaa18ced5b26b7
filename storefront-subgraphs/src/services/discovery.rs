//! The discovery subgraph: product recommendations.
//!
//! A real deployment would put a trained model here; the demo samples the
//! catalog at random, excluding the product being looked at.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;
use serde_json::Value;

use crate::error::ResolverError;
use crate::federation::entity_stub;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;

const CATALOG: &[&str] = &[
    "product:1",
    "product:2",
    "product:3",
    "product:4",
    "product:5",
];

const SAMPLE_PROBABILITY: f64 = 0.7;

pub struct DiscoveryService {
    catalog: Vec<String>,
}

impl DiscoveryService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            catalog: CATALOG.iter().map(|id| id.to_string()).collect(),
        })
    }

    /// `Product.recommendedProducts` / `User.recommendedProducts`.
    /// Key-only stubs; the products service owns the details.
    pub fn recommended_products(&self, exclude_product_id: Option<&str>) -> Vec<Value> {
        let mut rng = rand::rng();
        self.catalog
            .iter()
            .filter(|id| exclude_product_id != Some(id.as_str()))
            .filter(|_| rng.random_bool(SAMPLE_PROBABILITY))
            .map(|id| entity_stub("Product", id))
            .collect()
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new()
            .with(Arc::new(ProductReference {
                service: self.clone(),
            }))
            .with(Arc::new(UserReference {
                service: self.clone(),
            }))
    }
}

/// Extends `Product`, recommending everything but the product itself.
struct ProductReference {
    service: Arc<DiscoveryService>,
}

#[async_trait]
impl EntityResolver for ProductReference {
    fn type_name(&self) -> &'static str {
        "Product"
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
            "__typename": "Product",
            "id": id,
            "recommendedProducts": self.service.recommended_products(Some(id)),
        })))
    }
}

/// Extends `User`; with no product in view, anything can be recommended.
struct UserReference {
    service: Arc<DiscoveryService>,
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
            "recommendedProducts": self.service.recommended_products(None),
        })))
    }
}
