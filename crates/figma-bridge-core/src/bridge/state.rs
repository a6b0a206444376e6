//! Connection state snapshot published by the engine.

use serde::Serialize;
use serde_json::Value;

/// Lifecycle of the single plugin connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Socket accepted, handshake not yet received.
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

/// Point-in-time view of the engine, readable without a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BridgeStatus {
    pub state: ConnectionState,
    /// Handshake payload; present only while connected.
    pub document: Option<Value>,
    /// Outstanding command count.
    pub pending: usize,
}

impl BridgeStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Lifecycle notifications for the facade.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Connected { document: Value },
    Disconnected,
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_disconnected() {
        let status = BridgeStatus::default();
        assert_eq!(status.state, ConnectionState::Disconnected);
        assert!(!status.is_connected());
        assert!(status.document.is_none());
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ConnectionState::Connecting).unwrap(),
            serde_json::json!("connecting")
        );
    }
}
