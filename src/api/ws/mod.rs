//! WebSocket API support
//!
//! Provides a broadcast channel of dispatch-tree mutation events for
//! real-time farm dashboards, driven by the same status callbacks that
//! update the tree.

pub mod handler;

pub use handler::{ws_handler, BroadcastState, WsEvent};
