//! The inventory subgraph: extends `Variant` with warehouse availability.
//!
//! This service contributes nothing to `Product`; the router must never send
//! it a Product representation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use serde_json::Value;

use crate::error::ResolverError;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;
use crate::store::InventoryStore;

pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    /// `Variant.inventory`: null when the warehouse has no record, which is
    /// not an error.
    pub async fn variant_inventory(&self, variant_id: &str) -> Result<Value, ResolverError> {
        Ok(match self.store.units_on_hand(variant_id).await? {
            Some(count) => json!({
                "__typename": "Inventory",
                "inStock": count > 0,
                "inventory": count,
            }),
            None => Value::Null,
        })
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new().with(Arc::new(VariantReference {
            service: self.clone(),
        }))
    }
}

struct VariantReference {
    service: Arc<InventoryService>,
}

#[async_trait]
impl EntityResolver for VariantReference {
    fn type_name(&self) -> &'static str {
        "Variant"
    }

    fn key_fields(&self) -> &'static [&'static str] {
        &["id"]
    }

    async fn resolve_reference(
        &self,
        reference: &Representation,
    ) -> Result<Option<Value>, ResolverError> {
        let id = reference.key_str("id")?;
        let inventory = self.service.variant_inventory(id).await?;
        Ok(Some(json!({
            "__typename": "Variant",
            "id": id,
            "inventory": inventory,
        })))
    }
}
