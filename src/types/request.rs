//! Provider request and result shapes.

use super::Capability;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Request routed to a single provider.
///
/// `params` is opaque to the core; processors and providers agree on its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub kind: Capability,
    #[serde(default)]
    pub params: serde_json::Value,
    /// Cooperative cancellation; never serialized.
    #[serde(skip)]
    pub cancellation: Option<CancellationToken>,
}

impl ProviderRequest {
    pub fn new(kind: Capability, params: serde_json::Value) -> Self {
        Self {
            kind,
            params,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(|t| t.is_cancelled())
            .unwrap_or(false)
    }
}

impl PartialEq for ProviderRequest {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.params == other.params
    }
}

/// Result of a unary provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub kind: Capability,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ProviderResponse {
    pub fn new(kind: Capability, data: serde_json::Value) -> Self {
        Self { kind, data }
    }
}

/// What a dispatch produced, before output processors run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ProviderOutput {
    /// Data of every chunk a streaming provider emitted, in arrival order.
    Chunks(Vec<serde_json::Value>),
    /// The value a unary provider resolved with.
    Response(ProviderResponse),
}

impl ProviderOutput {
    pub fn as_chunks(&self) -> Option<&[serde_json::Value]> {
        match self {
            ProviderOutput::Chunks(c) => Some(c),
            ProviderOutput::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&ProviderResponse> {
        match self {
            ProviderOutput::Response(r) => Some(r),
            ProviderOutput::Chunks(_) => None,
        }
    }

    /// Concatenate string chunks, e.g. token deltas from a chat provider.
    ///
    /// Non-string chunks are skipped. A unary response yields its `data` when it is a string.
    pub fn text(&self) -> Option<String> {
        match self {
            ProviderOutput::Chunks(chunks) => Some(
                chunks
                    .iter()
                    .filter_map(|c| c.as_str())
                    .collect::<String>(),
            ),
            ProviderOutput::Response(r) => r.data.as_str().map(str::to_string),
        }
    }
}
