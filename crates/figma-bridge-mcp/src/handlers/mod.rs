//! JSON-RPC request handlers, split by domain.

mod lifecycle;
mod tool_calls;

use crate::server::AppState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    /// Absent for notifications.
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code: error.code,
                message: error.message,
                data: None,
            }),
            id,
        }
    }
}

/// Protocol-level failure, reported as a JSON-RPC error object.
///
/// Tool failures are not protocol failures: they come back as successful
/// responses carrying an `isError` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;

    pub fn parse(message: impl fmt::Display) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: format!("Parse error: {}", message),
        }
    }

    pub fn invalid_request(message: impl fmt::Display) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: format!("Invalid request: {}", message),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: message.into(),
        }
    }
}

// ============================================================================
// Parameter extraction helpers
// ============================================================================

/// Extract an optional string parameter.
pub(crate) fn get_str_param<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(Value::as_str)
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, RpcError> {
    get_str_param(params, name)
        .ok_or_else(|| RpcError::invalid_params(format!("Missing required parameter: {}", name)))
}

// ============================================================================
// Line handling
// ============================================================================

/// Handle one input line. Returns `None` for notifications.
pub async fn handle_line(state: &AppState, line: &str) -> Option<JsonRpcResponse> {
    debug!("<- {}", line);

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparsable input line: {}", e);
            return Some(JsonRpcResponse::error(None, RpcError::parse(e)));
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
        Ok(request) => request,
        Err(e) => {
            let id = value.get("id").cloned();
            return Some(JsonRpcResponse::error(id, RpcError::invalid_request(e)));
        }
    };

    let Some(id) = request.id else {
        debug!("Notification: {}", request.method);
        return None;
    };

    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::error(
            Some(id),
            RpcError::invalid_request("jsonrpc must be \"2.0\""),
        ));
    }

    let params = request.params.unwrap_or(Value::Object(Default::default()));
    Some(match dispatch_method(state, &request.method, &params).await {
        Ok(result) => JsonRpcResponse::success(Some(id), result),
        Err(e) => {
            warn!("RPC error for {}: {}", request.method, e.message);
            JsonRpcResponse::error(Some(id), e)
        }
    })
}

// ============================================================================
// Method dispatcher
// ============================================================================

async fn dispatch_method(state: &AppState, method: &str, params: &Value) -> Result<Value, RpcError> {
    match method {
        // Lifecycle
        "initialize" => Ok(lifecycle::initialize(params)),
        "ping" => Ok(lifecycle::ping()),

        // Tools
        "tools/list" => Ok(tool_calls::list_tools(state)),
        "tools/call" => tool_calls::call_tool(state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figma_bridge_core::{Bridge, EngineConfig};
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(Bridge::new(EngineConfig::default()), None)
    }

    async fn roundtrip(state: &AppState, request: Value) -> Value {
        let response = handle_line(state, &request.to_string()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let response = handle_line(&state(), "{not json").await.unwrap();
        let response = serde_json::to_value(response).unwrap();
        assert_eq!(response["error"]["code"], json!(-32700));
        assert_eq!(response["id"], Value::Null);
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let line = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(handle_line(&state(), &line).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = roundtrip(
            &state(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "resources/list"}),
        )
        .await;
        assert_eq!(response["id"], json!(7));
        assert_eq!(response["error"]["code"], json!(-32601));
        assert_eq!(response["error"]["message"], "Method not found: resources/list");
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let response = roundtrip(&state(), json!({"jsonrpc": "2.0", "id": "a"})).await;
        assert_eq!(response["id"], "a");
        assert_eq!(response["error"]["code"], json!(-32600));

        let response = roundtrip(&state(), json!({"jsonrpc": "1.0", "id": 1, "method": "ping"})).await;
        assert_eq!(response["error"]["code"], json!(-32600));
    }

    #[tokio::test]
    async fn test_ping() {
        let response = roundtrip(&state(), json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
        assert_eq!(response["result"], json!({}));
        assert!(response.get("error").is_none());
    }

    #[test]
    fn test_require_str_param() {
        let params = json!({"name": "figma_list_pages", "count": 3});
        assert_eq!(require_str_param(&params, "name").unwrap(), "figma_list_pages");
        let err = require_str_param(&params, "count").unwrap_err();
        assert_eq!(err.code, RpcError::INVALID_PARAMS);
        assert_eq!(err.message, "Missing required parameter: count");
    }
}
