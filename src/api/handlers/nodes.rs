//! Control endpoints under `/nodes/:id/...` and the render node
//! registration/heartbeat/command-report surface workers use.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::models::{
    CommandOutcome, CommandResponse, CommandStatusReport, HeartbeatRequest, RegisterRenderNodeRequest,
    RenderNodeResponse, SetDispatchKeyRequest, SetLicenceCapacityRequest, SetMaxRnRequest, SetNodeStatusRequest,
};
use crate::api::response::SuccessResponse;
use crate::api::routes::AppState;
use crate::api::ws::WsEvent;
use crate::api::{ApiError, ApiResult};
use crate::db::PersistenceMapper;
use crate::model::{Id, RenderNode};

/// `PUT /nodes/:id/status`: force a status transition from an operator
/// console: cancel, pause, or restart. Any other requested status is a
/// no-op the dependency engine already performs automatically.
pub async fn set_node_status(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(body): Json<SetNodeStatusRequest>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    let mut tree = state.tree.lock().await;
    {
        let node = tree.node_mut(id).ok_or_else(|| ApiError::NotFound(format!("node {id}")))?;
        node.common_mut().status = body.status;
    }
    tree.touch_node(id);
    tree.recompute_rollup_from(id);
    crate::dependency::evaluate(&mut tree, id);
    PersistenceMapper::flush(state.db.pool(), &mut tree).await?;

    state.broadcast.broadcast(WsEvent::NodeStatusChanged { node_id: id, status: body.status }).await;
    Ok(Json(SuccessResponse::new(())))
}

/// `PUT /nodes/:id/dispatch-key`
pub async fn set_dispatch_key(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(body): Json<SetDispatchKeyRequest>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    let mut tree = state.tree.lock().await;
    {
        let node = tree.node_mut(id).ok_or_else(|| ApiError::NotFound(format!("node {id}")))?;
        node.common_mut().dispatch_key = body.dispatch_key;
    }
    tree.touch_node(id);
    PersistenceMapper::flush(state.db.pool(), &mut tree).await?;
    Ok(Json(SuccessResponse::new(())))
}

/// `PUT /nodes/:id/max-rn`
pub async fn set_max_rn(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(body): Json<SetMaxRnRequest>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    let mut tree = state.tree.lock().await;
    {
        let node = tree.node_mut(id).ok_or_else(|| ApiError::NotFound(format!("node {id}")))?;
        node.common_mut().max_rn = body.max_rn;
    }
    tree.touch_node(id);
    PersistenceMapper::flush(state.db.pool(), &mut tree).await?;
    Ok(Json(SuccessResponse::new(())))
}

/// `PUT /licences/:token`: declare or change a licence token's total
/// concurrent capacity.
pub async fn set_licence_capacity(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<SetLicenceCapacityRequest>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    let mut licences = state.licences.lock().await;
    licences.set_capacity(token, body.capacity);
    Ok(Json(SuccessResponse::new(())))
}

/// `POST /render-nodes`: a worker daemon's initial registration call.
pub async fn register_render_node(
    State(state): State<AppState>,
    Json(body): Json<RegisterRenderNodeRequest>,
) -> ApiResult<Json<RenderNodeResponse>> {
    body.validate().map_err(ApiError::ValidationError)?;

    let mut tree = state.tree.lock().await;
    let id = tree.ids_mut().next("RenderNode");
    let mut rn = RenderNode::new(id, body.name, body.host, body.port);
    rn.cores_number = body.cores_number;
    rn.speed = body.speed;
    rn.ram_size = body.ram_size;
    rn.characteristics = body.characteristics;
    let id = tree.insert_render_node(rn);
    PersistenceMapper::flush(state.db.pool(), &mut tree).await?;

    state.broadcast.broadcast(WsEvent::RenderNodeRegistered { render_node_id: id }).await;

    let response = RenderNodeResponse::from(tree.render_node(id).expect("just inserted"));
    Ok(Json(response))
}

/// `POST /render-nodes/:id/heartbeat`: refreshes liveness and reconciles
/// any drift the worker reports about what it's currently running.
pub async fn heartbeat(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(body): Json<HeartbeatRequest>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    let mut tree = state.tree.lock().await;
    let rn = tree.render_node_mut(id).ok_or_else(|| ApiError::NotFound(format!("render node {id}")))?;
    rn.last_heartbeat = chrono::Utc::now();
    if let Some(command_id) = body.assigned_command {
        rn.assigned_command = Some(command_id);
    }
    let root = tree.root();
    tree.touch_node(root);
    Ok(Json(SuccessResponse::new(())))
}

/// `GET /render-nodes`
pub async fn list_render_nodes(State(state): State<AppState>) -> Json<Vec<RenderNodeResponse>> {
    let tree = state.tree.lock().await;
    Json(tree.render_nodes().map(RenderNodeResponse::from).collect())
}

/// `PUT /commands/:id/report`: the worker's status callback. Releases the
/// command's licence token on any terminal outcome.
pub async fn report_command_status(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(body): Json<CommandStatusReport>,
) -> ApiResult<Json<CommandResponse>> {
    let mut tree = state.tree.lock().await;
    let task_id = tree.command(id).ok_or_else(|| ApiError::NotFound(format!("command {id}")))?.task_id;
    let max_attempt = tree.task(task_id).map(|t| t.max_attempt).unwrap_or(1);
    let licence = tree.task(task_id).and_then(|t| t.licence.clone());

    {
        let cmd = tree.command_mut(id).expect("looked up above");
        match body.outcome {
            CommandOutcome::Progress => {
                if let Some(completion) = body.completion {
                    cmd.completion = completion;
                }
            }
            CommandOutcome::Done => {
                cmd.complete()?;
            }
            CommandOutcome::Error => {
                let message = body.message.clone().unwrap_or_else(|| "worker reported failure".to_string());
                cmd.fail(message, max_attempt)?;
            }
        }
    }

    let terminal = matches!(body.outcome, CommandOutcome::Done | CommandOutcome::Error);
    if terminal {
        if let Some(token) = licence {
            let mut licences = state.licences.lock().await;
            licences.release(&token);
        }
    }

    tree.touch_command(id);
    if let Some(task_node_id) = tree.task_node_for(task_id) {
        tree.recompute_rollup_from(task_node_id);
        crate::dependency::evaluate(&mut tree, task_node_id);
    }
    PersistenceMapper::flush(state.db.pool(), &mut tree).await?;

    let response = CommandResponse::from(tree.command(id).expect("looked up above"));
    Ok(Json(response))
}
