//! Centralized configuration for the Figma bridge.
//!
//! Constants for the plugin socket, the correlation engine and the Figma
//! REST API. Runtime overrides (port, host, token) come from the binary's
//! command line.

use std::time::Duration;

/// Plugin socket and correlation engine configuration.
pub struct BridgeConfig;

impl BridgeConfig {
    pub const SERVER_NAME: &'static str = "figma-mcp-bridge";
    pub const SERVER_VERSION: &'static str = "0.1.0";
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 3055;
    /// Number of ports above the preferred one tried when it is taken.
    pub const PORT_SCAN_RANGE: u16 = 15;
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
    pub const REQUEST_ID_PREFIX: &'static str = "req_";
    pub const SESSION_ID_PREFIX: &'static str = "sess_";
    /// WebSocket close code used for both supersede and shutdown.
    pub const CLOSE_CODE_NORMAL: u16 = 1000;
}

/// Model Context Protocol configuration.
pub struct McpConfig;

impl McpConfig {
    pub const PROTOCOL_VERSION: &'static str = "2024-11-05";
}

/// Figma REST API configuration (comments).
pub struct CommentsConfig;

impl CommentsConfig {
    pub const API_BASE: &'static str = "https://api.figma.com";
    pub const TOKEN_HEADER: &'static str = "X-Figma-Token";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Stale-process cleanup on the bridge port.
pub struct PortCleanupConfig;

impl PortCleanupConfig {
    pub const TERMINATE_TIMEOUT_MS: u64 = 2000;
    pub const RELEASE_DELAY: Duration = Duration::from_millis(500);
}
