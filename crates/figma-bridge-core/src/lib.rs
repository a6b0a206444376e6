//! Figma Bridge Core - correlation engine between tool calls and a Figma plugin.
//!
//! The Figma plugin connects over a local WebSocket. Tool calls are sent to
//! it as named commands and answered by a single correlated reply. This crate
//! owns the connection state machine, the pending-request table, the
//! heartbeat and the error taxonomy. It has no MCP layer of its own; see the
//! `figma-bridge-mcp` binary for that.
//!
//! # Example
//!
//! ```rust,ignore
//! use figma_bridge_core::{Bridge, EngineConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> figma_bridge_core::Result<()> {
//!     let bridge = Bridge::new(EngineConfig::default());
//!     let port = bridge.start("127.0.0.1", 3055).await?;
//!     println!("Waiting for the plugin on port {}", port);
//!
//!     // Once the plugin has connected and sent its handshake:
//!     let pong = bridge.send_command("ping", json!({})).await?;
//!     println!("{}", pong);
//!
//!     bridge.stop().await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod comments;
pub mod config;
pub mod error;
pub mod platform;

// Re-export commonly used types
pub use bridge::{Bridge, BridgeEvent, BridgeStatus, ConnectionState, EngineConfig};
pub use comments::{CommentFilter, FigmaApiClient};
pub use config::{BridgeConfig, CommentsConfig, McpConfig};
pub use error::{BridgeError, ErrorBody, Result};
