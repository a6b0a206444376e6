//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here rather than being
//! scattered through the bridge.

pub mod process;

pub use process::{find_port_owners, is_process_alive, release_port, terminate_process};
