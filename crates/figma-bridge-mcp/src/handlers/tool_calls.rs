//! Tool listing and invocation.

use super::{require_str_param, RpcError};
use crate::server::AppState;
use crate::tools;
use serde_json::{json, Value};
use tracing::info;

pub(super) fn list_tools(state: &AppState) -> Value {
    json!({ "tools": state.catalog.list() })
}

/// Unknown tools are a protocol error; everything after lookup is a tool
/// result, including validation and connection failures.
pub(super) async fn call_tool(state: &AppState, params: &Value) -> Result<Value, RpcError> {
    let name = require_str_param(params, "name")?;
    let tool = state
        .catalog
        .get(name)
        .ok_or_else(|| RpcError::invalid_params(format!("Unknown tool: {}", name)))?;

    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    let output = tools::call(state, tool, &arguments).await;
    if output.is_error {
        info!("Tool {} failed", name);
    }
    Ok(output.into_envelope())
}
