use displaydoc::Display;
use thiserror::Error;

use crate::graphql;

/// Resolver failures surfaced to the caller as structured GraphQL errors.
///
/// "No local data for this key" is deliberately not in here: that case is a
/// `None` entity, which signals "this subgraph has no contribution" and
/// permits partial composition.
#[derive(Debug, Display, Error)]
pub enum ResolverError {
    /// representation is not an object
    MalformedRepresentation,

    /// representation has no __typename
    MissingTypename,

    /// invalid representation for '{typename}': missing key field '{field}'
    MissingKeyField { typename: String, field: String },

    /// no entity resolver registered for type '{0}'
    UnknownEntityType(String),

    /// {0}
    NotFound(String),

    /// invalid argument: {0}
    InvalidArgument(String),

    /// store error: {0}
    Store(#[from] StoreError),

    /// serialization failed: {0}
    Serialization(#[from] serde_json::Error),
}

impl ResolverError {
    pub fn extension_code(&self) -> &'static str {
        match self {
            ResolverError::MalformedRepresentation
            | ResolverError::MissingTypename
            | ResolverError::MissingKeyField { .. }
            | ResolverError::UnknownEntityType(_) => "INVALID_REPRESENTATION",
            ResolverError::NotFound(_) => "NOT_FOUND",
            ResolverError::InvalidArgument(_) => "BAD_USER_INPUT",
            ResolverError::Store(_) => "STORE_ERROR",
            ResolverError::Serialization(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_graphql(&self) -> graphql::Error {
        graphql::Error::builder()
            .message(self.to_string())
            .extension_code(self.extension_code())
            .build()
    }
}

/// A failing data store access.
///
/// The in-memory stores never produce one, but the resolver contract has to
/// tolerate being swapped onto an I/O-bound store.
#[derive(Debug, Error)]
#[error("store unavailable: {0}")]
pub struct StoreError(pub String);
