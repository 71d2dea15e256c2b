//! WebSocket infrastructure for streaming nutrition analyses.
//!
//! Provides connection management, heartbeat monitoring, the per-connection
//! analysis session, and the HTTP upgrade handler used by the router.

mod handler;
mod heartbeat;
pub mod manager;
pub mod session;

pub use handler::nutrition_stream_handler;
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL};
pub use manager::WsManager;
