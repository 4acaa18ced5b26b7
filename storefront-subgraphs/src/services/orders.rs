//! The orders subgraph: order records and their buyer/item references.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use serde_json::Value;

use crate::error::ResolverError;
use crate::federation::entity_stub;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;
use crate::store::Order;
use crate::store::OrderStore;

pub struct OrdersService {
    store: Arc<dyn OrderStore>,
}

impl OrdersService {
    pub fn new(store: Arc<dyn OrderStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    pub async fn order(&self, id: &str) -> Result<Option<Value>, ResolverError> {
        Ok(self.store.order(id).await?.map(|o| order_value(&o)))
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new().with(Arc::new(OrderReference {
            service: self.clone(),
        }))
    }
}

fn order_value(order: &Order) -> Value {
    json!({
        "__typename": "Order",
        "id": order.id,
        "buyer": entity_stub("User", &order.buyer_id),
        "items": order
            .item_ids
            .iter()
            .map(|id| entity_stub("Variant", id))
            .collect::<Vec<_>>(),
    })
}

struct OrderReference {
    service: Arc<OrdersService>,
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
        self.service.order(reference.key_str("id")?).await
    }
}
