//! The reviews subgraph: reviews keyed by product upc and reviewer id.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use serde_json::Value;

use crate::error::ResolverError;
use crate::federation::entity_stub;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;
use crate::store::Review;
use crate::store::ReviewStore;

pub struct ReviewsService {
    store: Arc<dyn ReviewStore>,
}

impl ReviewsService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    /// `Product.reviews`. No reviews is an empty list, never an error.
    pub async fn product_reviews(&self, upc: &str) -> Result<Vec<Value>, ResolverError> {
        Ok(self
            .store
            .reviews_for_product(upc)
            .await?
            .iter()
            .map(review_value)
            .collect())
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new()
            .with(Arc::new(ReviewReference {
                service: self.clone(),
            }))
            .with(Arc::new(ProductReference {
                service: self.clone(),
            }))
    }
}

fn review_value(review: &Review) -> Value {
    json!({
        "__typename": "Review",
        "id": review.id,
        "author": review.author,
        "body": review.body,
        // both the product and the reviewer live in other subgraphs
        "product": { "__typename": "Product", "upc": review.product_upc },
        "user": entity_stub("User", &review.user_id),
    })
}

struct ReviewReference {
    service: Arc<ReviewsService>,
}

#[async_trait]
impl EntityResolver for ReviewReference {
    fn type_name(&self) -> &'static str {
        "Review"
    }

    fn key_fields(&self) -> &'static [&'static str] {
        &["id"]
    }

    async fn resolve_reference(
        &self,
        reference: &Representation,
    ) -> Result<Option<Value>, ResolverError> {
        let id = reference.key_str("id")?;
        Ok(self.service.store.review(id).await?.map(|r| review_value(&r)))
    }
}

/// Extends `Product` with its review list; products are keyed by upc here.
struct ProductReference {
    service: Arc<ReviewsService>,
}

#[async_trait]
impl EntityResolver for ProductReference {
    fn type_name(&self) -> &'static str {
        "Product"
    }

    fn key_fields(&self) -> &'static [&'static str] {
        &["upc"]
    }

    async fn resolve_reference(
        &self,
        reference: &Representation,
    ) -> Result<Option<Value>, ResolverError> {
        let upc = reference.key_str("upc")?;
        Ok(Some(json!({
            "__typename": "Product",
            "upc": upc,
            "reviews": self.service.product_reviews(upc).await?,
        })))
    }
}
