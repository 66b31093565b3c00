//! System info, metrics and status endpoints.

use axum::extract::State;
use axum::Json;

use crate::api::models::{StatusResponse, SystemInfoResponse, SystemMetricsResponse};
use crate::api::routes::AppState;
use crate::model::CommandStatus;

pub async fn system_info() -> Json<SystemInfoResponse> {
    Json(SystemInfoResponse {
        version: crate::version::VERSION.to_string(),
        pkg_name: crate::version::PKG_NAME.to_string(),
    })
}

pub async fn system_metrics(State(state): State<AppState>) -> Json<SystemMetricsResponse> {
    let tree = state.tree.lock().await;
    let licences = state.licences.lock().await;

    let total_tasks = tree.nodes().filter(|n| !n.is_folder()).count() as i64;
    let running_commands = tree
        .nodes()
        .filter_map(|n| n.as_task_node())
        .flat_map(|tn| tree.commands_of(tn.task_id))
        .filter(|c| c.status == CommandStatus::Running)
        .count() as i64;
    let ready_commands = tree
        .nodes()
        .filter_map(|n| n.as_task_node())
        .flat_map(|tn| tree.commands_of(tn.task_id))
        .filter(|c| c.status == CommandStatus::Ready)
        .count() as i64;
    let total_render_nodes = tree.render_nodes().count() as i64;
    let idle_render_nodes = tree.render_nodes().filter(|rn| rn.is_idle()).count() as i64;

    Json(SystemMetricsResponse {
        total_tasks,
        running_commands,
        ready_commands,
        total_render_nodes,
        idle_render_nodes,
        exhausted_licences: licences.exhausted_count() as i64,
    })
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let database = if state.db.health_check().await.is_ok() { "connected" } else { "error" };
    Json(StatusResponse {
        name: "dispatcher".to_string(),
        uuid: state.server_uuid.clone(),
        version: crate::version::VERSION.to_string(),
        status: "running".to_string(),
        connected_clients: state.broadcast.tx.receiver_count() as u32,
        database: database.to_string(),
    })
}
