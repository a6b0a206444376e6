//! Plugin connection and command correlation.
//!
//! # Architecture
//!
//! - **Transport**: WebSocket endpoint holding at most one plugin socket
//! - **Engine**: connection state machine, pending-request table, heartbeat
//! - **Protocol**: JSON frames exchanged with the plugin

pub mod engine;
mod heartbeat;
mod pending;
pub mod protocol;
pub mod state;
pub mod transport;

pub use engine::{Bridge, EngineConfig};
pub use state::{BridgeEvent, BridgeStatus, ConnectionState};
pub use transport::{
    CloseReason, ConnectionId, EndpointHandle, Outbound, PeerEvents, PeerLink, SocketEndpoint,
};
