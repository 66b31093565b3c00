//! API request handlers
//!
//! Provides handler functions for all API endpoints organized by resource.

pub mod graphs;
pub mod health;
pub mod nodes;
pub mod system;

pub use graphs::{get_node, submit_graph};
pub use health::{health, health_detailed};
pub use nodes::{
    heartbeat, list_render_nodes, register_render_node, report_command_status, set_dispatch_key,
    set_licence_capacity, set_max_rn, set_node_status,
};
pub use system::{status, system_info, system_metrics};

pub use crate::api::ws::ws_handler;
