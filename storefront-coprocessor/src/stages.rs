//! The externalized pipeline wire format.
//!
//! Each call carries one stage payload; the response is the same shape with
//! any mutations applied. Fields this process does not understand must survive
//! the round trip untouched, so everything unrecognized lands in `extra`.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use strum_macros::Display;

/// Version of the externalized data. Rev this if it changes.
pub const EXTERNALIZABLE_VERSION: u8 = 1;

/// The points in the router's pipeline at which this process can be invoked.
#[derive(Clone, Copy, Debug, Display, Deserialize, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineStage {
    RouterRequest,
    RouterResponse,
    SupergraphRequest,
    SupergraphResponse,
    ExecutionRequest,
    ExecutionResponse,
    SubgraphRequest,
    SubgraphResponse,
}

/// Directive returned to the router: keep going, or short-circuit the
/// pipeline with the given HTTP status.
#[derive(Clone, Debug, Default, Display, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Control {
    #[default]
    Continue,
    Break(u16),
}

/// One externalized pipeline call.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePayload {
    pub version: u8,
    pub stage: PipelineStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<Control>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Stage-specific fields (sdl, method, serviceName, ...) that pass
    /// through unmodified.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StagePayload {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}
