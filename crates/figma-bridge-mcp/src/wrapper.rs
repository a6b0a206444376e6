//! Tool result envelopes.
//!
//! MCP clients receive every tool result as a single text block holding
//! pretty-printed JSON: `{content: [{type: "text", text}], isError?: true}`.
//! Failures carry `{error: {code, message, details?}}` as their text.

use figma_bridge_core::{BridgeError, Result};
use serde_json::{json, Value};

/// Outcome of one tool call, before wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub body: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(body: Value) -> Self {
        Self {
            body,
            is_error: false,
        }
    }

    pub fn failure(body: Value) -> Self {
        Self {
            body,
            is_error: true,
        }
    }

    pub fn from_error(err: &BridgeError) -> Self {
        Self::failure(json!({ "error": err.to_body() }))
    }

    /// Wrap into the MCP `CallToolResult` shape.
    pub fn into_envelope(self) -> Value {
        let text = serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| self.body.to_string());
        let mut envelope = json!({
            "content": [{"type": "text", "text": text}]
        });
        if self.is_error {
            envelope["isError"] = Value::Bool(true);
        }
        envelope
    }
}

impl From<Result<Value>> for ToolOutput {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::from_error(&e),
        }
    }
}
