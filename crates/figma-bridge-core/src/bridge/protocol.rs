//! Wire frames exchanged with the Figma plugin.
//!
//! Every frame is a single JSON text message:
//!
//! ```text
//! plugin -> bridge  {"type":"handshake","payload":{...document metadata...}}
//! bridge -> plugin  {"type":"handshake_ack","payload":{"serverVersion":..,"sessionId":..}}
//! bridge -> plugin  {"type":"ping","timestamp":<epoch ms>}
//! plugin -> bridge  {"type":"pong"}
//! bridge -> plugin  {"requestId":"req_7","command":"get_nodes","payload":{...}}
//! plugin -> bridge  {"responseTo":"req_7","payload":{...} | {"error":{code,message,details}}}
//! ```

use crate::config::BridgeConfig;
use crate::{BridgeError, Result};
use serde::Serialize;
use serde_json::Value;

/// A frame received from the plugin, classified by the engine's needs.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Session handshake carrying the document metadata payload.
    Handshake { payload: Value },
    /// Heartbeat answer.
    Pong,
    /// Reply correlated to an earlier command.
    Reply { response_to: String, payload: Value },
    /// Anything else; dropped by the engine.
    Unknown,
}

impl InboundFrame {
    /// Parse a raw text frame.
    ///
    /// Fails only on invalid JSON. Well-formed JSON that does not match a
    /// known frame shape is `Unknown`.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        match value.get("type").and_then(Value::as_str) {
            Some("handshake") => {
                return Ok(InboundFrame::Handshake {
                    payload: value.get("payload").cloned().unwrap_or(Value::Null),
                })
            }
            Some("pong") => return Ok(InboundFrame::Pong),
            _ => {}
        }

        match value.get("responseTo").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => Ok(InboundFrame::Reply {
                response_to: id.to_string(),
                payload: value.get("payload").cloned().unwrap_or(Value::Null),
            }),
            _ => Ok(InboundFrame::Unknown),
        }
    }
}

/// Outcome carried by a reply payload.
pub fn reply_outcome(payload: Value) -> std::result::Result<Value, BridgeError> {
    match payload.get("error") {
        Some(error) if is_truthy(error) => Err(BridgeError::from_remote(error)),
        _ => Ok(payload),
    }
}

/// `null`, `false`, `0` and `""` mean no error.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HandshakeAckPayload<'a> {
    server_version: &'a str,
    session_id: &'a str,
}

#[derive(Serialize)]
struct TypedFrame<'a, P: Serialize> {
    #[serde(rename = "type")]
    kind: &'a str,
    payload: P,
}

#[derive(Serialize)]
struct PingFrame {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandFrame<'a> {
    request_id: &'a str,
    command: &'a str,
    payload: &'a Value,
}

/// Encode the handshake acknowledgement.
pub fn handshake_ack(session_id: &str) -> Result<String> {
    let frame = TypedFrame {
        kind: "handshake_ack",
        payload: HandshakeAckPayload {
            server_version: BridgeConfig::SERVER_VERSION,
            session_id,
        },
    };
    Ok(serde_json::to_string(&frame)?)
}

/// Encode a heartbeat ping stamped with the current wall-clock time.
pub fn ping() -> Result<String> {
    let frame = PingFrame {
        kind: "ping",
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    Ok(serde_json::to_string(&frame)?)
}

/// Encode a command request.
pub fn command(request_id: &str, command: &str, payload: &Value) -> Result<String> {
    let frame = CommandFrame {
        request_id,
        command,
        payload,
    };
    Ok(serde_json::to_string(&frame)?)
}
