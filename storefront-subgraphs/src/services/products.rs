//! The products subgraph: the catalog of products and their variants.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;

use crate::error::ResolverError;
use crate::federation::entity_stub;
use crate::federation::entity_value;
use crate::federation::EntityRegistry;
use crate::federation::EntityResolver;
use crate::federation::Representation;
use crate::store::Product;
use crate::store::ProductStore;
use crate::store::Variant;

pub struct ProductsService {
    store: Arc<dyn ProductStore>,
}

impl ProductsService {
    pub fn new(store: Arc<dyn ProductStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    pub async fn product(&self, id: &str) -> Result<Option<Value>, ResolverError> {
        match self.store.product(id).await? {
            Some(product) => Ok(Some(self.product_value(&product)?)),
            None => Ok(None),
        }
    }

    pub async fn variant(&self, id: &str) -> Result<Option<Value>, ResolverError> {
        match self.store.variant(id).await? {
            Some(variant) => Ok(Some(self.variant_value(&variant)?)),
            None => Ok(None),
        }
    }

    /// Best-effort local prefix filter; an empty result set is a valid answer.
    pub async fn search_products(
        &self,
        title_starts_with: Option<&str>,
    ) -> Result<Vec<Value>, ResolverError> {
        self.store
            .products()
            .await?
            .iter()
            .filter(|p| title_starts_with.is_none_or(|prefix| p.title.starts_with(prefix)))
            .map(|p| self.product_value(p))
            .collect()
    }

    pub async fn search_variants(
        &self,
        size_starts_with: Option<&str>,
    ) -> Result<Vec<Value>, ResolverError> {
        self.store
            .variants()
            .await?
            .iter()
            .filter(|v| {
                size_starts_with.is_none_or(|prefix| {
                    v.size.as_deref().is_some_and(|size| size.starts_with(prefix))
                })
            })
            .map(|v| self.variant_value(v))
            .collect()
    }

    /// `Product.variants`, optionally filtered by size prefix.
    pub async fn product_variants(
        &self,
        product_id: &str,
        size_starts_with: Option<&str>,
    ) -> Result<Vec<Value>, ResolverError> {
        let Some(product) = self.store.product(product_id).await? else {
            return Ok(Vec::new());
        };
        let mut variants = Vec::new();
        for variant_id in &product.variant_ids {
            if let Some(variant) = self.store.variant(variant_id).await? {
                let matches = size_starts_with.is_none_or(|prefix| {
                    variant
                        .size
                        .as_deref()
                        .is_some_and(|size| size.starts_with(prefix))
                });
                if matches {
                    variants.push(self.variant_value(&variant)?);
                }
            }
        }
        Ok(variants)
    }

    fn product_value(&self, product: &Product) -> Result<Value, ResolverError> {
        let mut value = entity_value("Product", product)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("upc".to_string(), Value::String(product.id.clone()));
            object.insert(
                "releaseDate".to_string(),
                Value::String(mock_release_date()),
            );
            object.insert(
                "variants".to_string(),
                Value::Array(
                    product
                        .variant_ids
                        .iter()
                        .map(|id| entity_stub("Variant", id))
                        .collect(),
                ),
            );
        }
        Ok(value)
    }

    fn variant_value(&self, variant: &Variant) -> Result<Value, ResolverError> {
        let mut value = entity_value("Variant", variant)?;
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "product".to_string(),
                entity_stub("Product", &variant.product_id),
            );
        }
        Ok(value)
    }

    pub fn registry(self: &Arc<Self>) -> EntityRegistry {
        EntityRegistry::new()
            .with(Arc::new(ProductReference {
                service: self.clone(),
            }))
            .with(Arc::new(VariantReference {
                service: self.clone(),
            }))
    }
}

/// Mock date within ten days of today, as the demo catalog has no real one.
fn mock_release_date() -> String {
    let offset = rand::rng().random_range(-10..=10);
    (chrono::Utc::now() + chrono::Duration::days(offset)).to_rfc3339()
}

struct ProductReference {
    service: Arc<ProductsService>,
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
        // some subgraphs key Product by upc, which is the same value as id
        let id = match reference.get("id").and_then(Value::as_str) {
            Some(id) => id,
            None => reference.key_str("upc").map_err(|_| {
                ResolverError::MissingKeyField {
                    typename: "Product".to_string(),
                    field: "id".to_string(),
                }
            })?,
        };
        self.service.product(id).await
    }
}

struct VariantReference {
    service: Arc<ProductsService>,
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
        self.service.variant(reference.key_str("id")?).await
    }
}
