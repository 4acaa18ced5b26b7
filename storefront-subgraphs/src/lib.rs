//! Resolver sets for the storefront's federated subgraphs.
//!
//! Each service in [`services`] implements field resolvers against its own
//! store and registers reference resolvers for the entity types it
//! contributes to. The router (an external collaborator) assembles full
//! entities by merging each subgraph's contribution for the same key; nothing
//! here ever calls another subgraph.

pub mod context;
pub mod error;
pub mod federation;
pub mod graphql;
pub mod services;
pub mod store;

pub use context::RequestContext;
pub use error::ResolverError;
pub use error::StoreError;
pub use federation::EntityRegistry;
pub use federation::EntityResolver;
pub use federation::Representation;
