//! The entity reference resolution contract.
//!
//! The router's query planner crosses a subgraph boundary by sending a
//! *representation*: a partial entity carrying `__typename` and the declared
//! key fields, nothing else. Each contributing subgraph registers one
//! [`EntityResolver`] per entity type it extends; resolution is local-only
//! and side-effect free, so the router may fan out concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::ResolverError;

/// A partial entity produced by the router when crossing a subgraph boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Representation {
    pub typename: String,
    pub fields: Map<String, Value>,
}

impl Representation {
    pub fn from_value(value: &Value) -> Result<Self, ResolverError> {
        let object = value
            .as_object()
            .ok_or(ResolverError::MalformedRepresentation)?;
        let typename = object
            .get("__typename")
            .and_then(Value::as_str)
            .ok_or(ResolverError::MissingTypename)?
            .to_string();
        let fields = object
            .iter()
            .filter(|(k, _)| k.as_str() != "__typename")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { typename, fields })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A required string-valued key field; its absence is a caller contract
    /// violation, not a not-found.
    pub fn key_str(&self, field: &str) -> Result<&str, ResolverError> {
        self.get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| ResolverError::MissingKeyField {
                typename: self.typename.clone(),
                field: field.to_string(),
            })
    }
}

/// A reference resolver for one entity type in one subgraph.
///
/// `Ok(None)` means "this subgraph has no contribution for this key" and is
/// not an error; the router composes whatever the other subgraphs return.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn key_fields(&self) -> &'static [&'static str];

    async fn resolve_reference(
        &self,
        reference: &Representation,
    ) -> Result<Option<Value>, ResolverError>;
}

/// The per-service table of reference resolvers, backing the federation
/// `_entities(representations:)` machinery.
#[derive(Default)]
pub struct EntityRegistry {
    resolvers: HashMap<&'static str, Arc<dyn EntityResolver>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: Arc<dyn EntityResolver>) -> Self {
        self.register(resolver);
        self
    }

    pub fn register(&mut self, resolver: Arc<dyn EntityResolver>) {
        self.resolvers.insert(resolver.type_name(), resolver);
    }

    pub fn resolves(&self, typename: &str) -> bool {
        self.resolvers.contains_key(typename)
    }

    /// Resolve a batch of representations, in order. A representation for a
    /// type this service never registered is a composition bug upstream and
    /// fails the batch.
    pub async fn resolve_representations(
        &self,
        representations: &[Value],
    ) -> Result<Vec<Option<Value>>, ResolverError> {
        let mut entities = Vec::with_capacity(representations.len());
        for value in representations {
            let reference = Representation::from_value(value)?;
            let resolver = self
                .resolvers
                .get(reference.typename.as_str())
                .ok_or_else(|| ResolverError::UnknownEntityType(reference.typename.clone()))?;
            entities.push(resolver.resolve_reference(&reference).await?);
        }
        Ok(entities)
    }
}

/// Serialize a local record as an entity value tagged with its `__typename`.
pub fn entity_value<T: Serialize>(typename: &str, entity: &T) -> Result<Value, ResolverError> {
    let mut value = serde_json::to_value(entity)?;
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "__typename".to_string(),
            Value::String(typename.to_string()),
        );
    }
    Ok(value)
}

/// A key-only stub for an entity owned by another subgraph. Emitting one of
/// these is the only way a service may talk about data it does not own.
pub fn entity_stub(typename: &str, id: &str) -> Value {
    serde_json::json!({ "__typename": typename, "id": id })
}
