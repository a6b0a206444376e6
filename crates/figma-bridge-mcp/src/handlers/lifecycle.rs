//! Session lifecycle: initialize and ping.

use super::get_str_param;
use figma_bridge_core::{BridgeConfig, McpConfig};
use serde_json::{json, Value};
use tracing::info;

const INSTRUCTIONS: &str = include_str!("../instructions.md");

pub(super) fn initialize(params: &Value) -> Value {
    let protocol_version =
        get_str_param(params, "protocolVersion").unwrap_or(McpConfig::PROTOCOL_VERSION);
    let client = params
        .get("clientInfo")
        .and_then(|info| info.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    info!("MCP client connected: {} (protocol {})", client, protocol_version);

    json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {"listChanged": false}
        },
        "serverInfo": {
            "name": BridgeConfig::SERVER_NAME,
            "version": BridgeConfig::SERVER_VERSION,
        },
        "instructions": INSTRUCTIONS,
    })
}

pub(super) fn ping() -> Value {
    json!({})
}
