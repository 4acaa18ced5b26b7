//! The subset of the GraphQL response format the resolver sets produce.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as attached to a response by a subgraph.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The optional GraphQL extensions for this error.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder with `.message()` and optional `.extension_code()`
    /// setters. The code lands in the extensions map under `"code"`.
    #[builder(visibility = "pub")]
    fn new(message: String, extension_code: Option<String>) -> Self {
        let mut extensions = Map::new();
        if let Some(code) = extension_code {
            extensions.insert("code".to_string(), Value::String(code));
        }
        Self {
            message,
            extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_code_lands_under_code() {
        let error = Error::builder()
            .message("boom")
            .extension_code("NOT_FOUND")
            .build();
        assert_eq!(error.message, "boom");
        assert_eq!(
            error.extensions.get("code"),
            Some(&Value::String("NOT_FOUND".to_string()))
        );
    }

    #[test]
    fn code_is_omitted_when_absent() {
        let error = Error::builder().message("boom").build();
        assert!(error.extensions.is_empty());
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json, serde_json::json!({"message": "boom"}));
    }
}
