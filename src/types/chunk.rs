//! Streaming chunk emitted by streaming providers.

use serde::{Deserialize, Serialize};

/// One increment of a streaming provider's output.
///
/// A chunk is terminal when `done` is set or `error` is present; nothing
/// emitted after a terminal chunk is consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl StreamChunk {
    pub fn data(data: impl Into<serde_json::Value>) -> Self {
        Self {
            done: false,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            data: None,
            error: None,
        }
    }

    pub fn error(error: impl Into<serde_json::Value>) -> Self {
        Self {
            done: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Mark this chunk as the last one.
    pub fn finish(mut self) -> Self {
        self.done = true;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.done || self.error.is_some()
    }
}
