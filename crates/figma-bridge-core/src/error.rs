//! Error types for the Figma bridge.
//!
//! Every variant carries a stable string code (`NOT_CONNECTED`, `TIMEOUT`,
//! `CONNECTION_CLOSED`, ...) which is what tool callers see. Errors reported
//! by the plugin itself keep the plugin's own code and message.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    // Correlation engine errors
    #[error("Figma plugin is not connected. Please open Figma and run the Claude Bridge plugin.")]
    NotConnected,

    #[error("Plugin connection is required to determine the file key. Please open Figma and run the Claude Bridge plugin.")]
    FileKeyNeedsPlugin,

    #[error("Command \"{command}\" timed out after {}ms", .timeout.as_millis())]
    Timeout { command: String, timeout: Duration },

    #[error("Connection closed")]
    ConnectionClosed,

    /// Application error reported by the plugin, passed through unchanged.
    #[error("{message}")]
    Remote {
        code: String,
        message: String,
        details: Option<Value>,
    },

    // Transport errors
    #[error("No free port between {first} and {last}")]
    BindExhausted { first: u16, last: u16 },

    // Tool parameter errors
    #[error("{message}")]
    InvalidParams { message: String },

    // Comments API errors
    #[error(
        "FIGMA_PAT environment variable is not set. Create a Personal Access Token at \
         Figma > Settings > Security > Personal access tokens with file_comments:read and \
         file_comments:write scopes, then set FIGMA_PAT=figd_xxx in your environment."
    )]
    PatNotConfigured,

    #[error("File key not available from plugin. Ensure you have the file open in Figma.")]
    FileKeyUnavailable,

    #[error("Rate limited by Figma API. Retry after {} seconds.", retry_after_label(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed. Check that FIGMA_PAT is valid and has file_comments scopes.")]
    AuthFailed,

    #[error("Figma API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    // System errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("{0}")]
    Other(String),
}

fn retry_after_label(secs: &Option<u64>) -> String {
    match secs {
        Some(secs) => secs.to_string(),
        None => "unknown".to_string(),
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Serializable error shape delivered to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

// Conversion implementations for common error types

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Network {
            message: err.to_string(),
        }
    }
}

impl BridgeError {
    /// Build a remote error from a plugin `error` object, filling in the
    /// defaults for missing fields.
    pub fn from_remote(error: &Value) -> Self {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .unwrap_or("UNKNOWN_ERROR");
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown error");
        BridgeError::Remote {
            code: code.to_string(),
            message: message.to_string(),
            details: error.get("details").filter(|d| !d.is_null()).cloned(),
        }
    }

    /// Create an invalid-params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        BridgeError::InvalidParams {
            message: message.into(),
        }
    }

    /// Stable error code string.
    pub fn code(&self) -> &str {
        match self {
            BridgeError::NotConnected | BridgeError::FileKeyNeedsPlugin => "NOT_CONNECTED",
            BridgeError::Timeout { .. } => "TIMEOUT",
            BridgeError::ConnectionClosed => "CONNECTION_CLOSED",
            BridgeError::Remote { code, .. } => code,
            BridgeError::BindExhausted { .. } => "BIND_EXHAUSTED",
            BridgeError::InvalidParams { .. } => "INVALID_PARAMS",
            BridgeError::PatNotConfigured => "PAT_NOT_CONFIGURED",
            BridgeError::FileKeyUnavailable => "FILE_KEY_UNAVAILABLE",
            BridgeError::RateLimited { .. } => "RATE_LIMITED",
            BridgeError::AuthFailed => "AUTH_FAILED",
            BridgeError::Api { .. } => "API_ERROR",
            BridgeError::Network { .. } => "NETWORK_ERROR",
            BridgeError::Io { .. } => "IO_ERROR",
            BridgeError::Json { .. } => "JSON_ERROR",
            BridgeError::Other(_) => "UNKNOWN_ERROR",
        }
    }

    /// Convert to the `{code, message, details}` shape returned to callers.
    pub fn to_body(&self) -> ErrorBody {
        let details = match self {
            BridgeError::Remote { details, .. } => details.clone(),
            _ => None,
        };
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            details,
        }
    }

    /// Check if the same call may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::NotConnected
                | BridgeError::FileKeyNeedsPlugin
                | BridgeError::RateLimited { .. }
                | BridgeError::Network { .. }
        )
    }

    /// The command may or may not have been executed by the plugin.
    ///
    /// Replies are not idempotent, so callers must not blindly retry these.
    pub fn outcome_unknown(&self) -> bool {
        matches!(
            self,
            BridgeError::Timeout { .. } | BridgeError::ConnectionClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timeout_message() {
        let err = BridgeError::Timeout {
            command: "get_nodes".into(),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(
            err.to_string(),
            "Command \"get_nodes\" timed out after 60000ms"
        );
        assert_eq!(err.code(), "TIMEOUT");
    }

    #[test]
    fn test_remote_passthrough() {
        let err = BridgeError::from_remote(&json!({
            "code": "NODE_NOT_FOUND",
            "message": "Node 1:2 not found",
            "details": {"nodeId": "1:2"}
        }));
        let body = err.to_body();
        assert_eq!(body.code, "NODE_NOT_FOUND");
        assert_eq!(body.message, "Node 1:2 not found");
        assert_eq!(body.details, Some(json!({"nodeId": "1:2"})));
    }

    #[test]
    fn test_remote_defaults() {
        let body = BridgeError::from_remote(&json!({})).to_body();
        assert_eq!(body.code, "UNKNOWN_ERROR");
        assert_eq!(body.message, "Unknown error");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_body_omits_missing_details() {
        let value = serde_json::to_value(BridgeError::ConnectionClosed.to_body()).unwrap();
        assert_eq!(
            value,
            json!({"code": "CONNECTION_CLOSED", "message": "Connection closed"})
        );
    }

    #[test]
    fn test_rate_limit_message() {
        let err = BridgeError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(
            err.to_string(),
            "Rate limited by Figma API. Retry after unknown seconds."
        );
    }

    #[test]
    fn test_classification() {
        assert!(BridgeError::NotConnected.is_retryable());
        assert!(!BridgeError::NotConnected.outcome_unknown());
        assert!(BridgeError::ConnectionClosed.outcome_unknown());
        assert!(!BridgeError::AuthFailed.is_retryable());
    }
}
