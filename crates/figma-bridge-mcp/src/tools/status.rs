//! Server status and document context.

use super::{Action, Command, ToolDef};
use crate::server::AppState;
use crate::wrapper::ToolOutput;
use figma_bridge_core::BridgeError;
use serde_json::{json, Value};

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::local(
            "figma_server_info",
            Action::ServerInfo,
            "Get information about the MCP server including the WebSocket port it is running on.",
        ),
        ToolDef::local(
            "figma_get_context",
            Action::GetContext,
            "Get the current Figma document context including file info, current page, and selection. Use this to understand what document is open and what the user has selected.",
        ),
    ]
}

pub(super) fn server_info(state: &AppState) -> ToolOutput {
    ToolOutput::success(json!({
        "port": state.bridge.port(),
        "connected": state.bridge.is_connected(),
        "documentInfo": state.bridge.document_info(),
    }))
}

/// Disconnection is a normal answer here, not an error.
pub(super) async fn get_context(state: &AppState) -> ToolOutput {
    let bridge = &state.bridge;
    if !bridge.is_connected() {
        return ToolOutput::success(json!({
            "connected": false,
            "message": BridgeError::NotConnected.to_string(),
        }));
    }

    match bridge
        .send_command(Command::GetContext.as_str(), json!({}))
        .await
    {
        Ok(Value::Object(mut context)) => {
            context.insert("connected".into(), Value::Bool(true));
            ToolOutput::success(Value::Object(context))
        }
        Ok(other) => ToolOutput::success(json!({"connected": true, "context": other})),
        Err(e) => {
            // A timeout leaves the link in place; only NOT_CONNECTED is conclusive.
            let connected = !matches!(e, BridgeError::NotConnected) && bridge.is_connected();
            ToolOutput::failure(json!({
                "connected": connected,
                "error": {"code": e.code(), "message": e.to_string()},
            }))
        }
    }
}
