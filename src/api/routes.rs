//! API route definitions
//!
//! Defines all API routes and their associated handler functions.

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::{handlers, ws::BroadcastState};
use crate::assignment::LicenceRegistry;
use crate::db::DatabaseConnection;
use crate::tree::DispatchTree;

/// Shared application state. The dispatch tree and licence registry are
/// mutated by exactly one writer at a time, the same single-writer
/// discipline the assignment loop assumes; `tokio::sync::Mutex` lets a
/// handler hold the lock across the `PersistenceMapper::flush` await.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub broadcast: Arc<BroadcastState>,
    pub tree: Arc<Mutex<DispatchTree>>,
    pub licences: Arc<Mutex<LicenceRegistry>>,
    pub server_uuid: String,
}

/// Build the complete API router
pub fn create_router(
    db: DatabaseConnection,
    broadcast: Arc<BroadcastState>,
    tree: Arc<Mutex<DispatchTree>>,
    licences: Arc<Mutex<LicenceRegistry>>,
    server_uuid: String,
) -> Router {
    let app_state = AppState { db, broadcast, tree, licences, server_uuid };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/system/health", get(handlers::health_detailed))
        .route("/api/v1/system/info", get(handlers::system_info))
        .route("/api/v1/system/metrics", get(handlers::system_metrics))
        .route("/api/status", get(handlers::status))
        // Submission
        .route("/graphs", post(handlers::submit_graph))
        .route("/graphs/:id", get(handlers::get_node))
        // Node control
        .route("/nodes/:id", get(handlers::get_node))
        .route("/nodes/:id/status", put(handlers::set_node_status))
        .route("/nodes/:id/dispatch-key", put(handlers::set_dispatch_key))
        .route("/nodes/:id/max-rn", put(handlers::set_max_rn))
        // Worker-facing surface
        .route("/render-nodes", post(handlers::register_render_node).get(handlers::list_render_nodes))
        .route("/render-nodes/:id/heartbeat", post(handlers::heartbeat))
        .route("/commands/:id/report", put(handlers::report_command_status))
        .route("/licences/:token", put(handlers::set_licence_capacity))
        .route("/ws", get(handlers::ws_handler))
        .with_state(app_state)
}

#[cfg(test)]
pub fn create_test_router(db: DatabaseConnection) -> Router {
    let broadcast = Arc::new(BroadcastState::new());
    let tree = Arc::new(Mutex::new(DispatchTree::new()));
    let licences = Arc::new(Mutex::new(LicenceRegistry::new()));
    create_router(db, broadcast, tree, licences, "test-server".to_string())
}
