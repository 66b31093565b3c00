//! `POST /graphs/`: the submission endpoint, decoded by `submission::submit`
//! and grafted onto the live dispatch tree.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::models::{NodeResponse, SubmissionResponse};
use crate::api::routes::AppState;
use crate::api::ws::WsEvent;
use crate::api::{ApiError, ApiResult};
use crate::db::PersistenceMapper;
use crate::graph_builder::wire::SubmissionWire;
use crate::model::Id;

/// `POST /graphs/`
pub async fn submit_graph(
    State(state): State<AppState>,
    Json(doc): Json<SubmissionWire>,
) -> ApiResult<Json<SubmissionResponse>> {
    let mut tree = state.tree.lock().await;
    let result = crate::submission::submit(&mut tree, &doc)?;
    PersistenceMapper::flush(state.db.pool(), &mut tree).await?;

    state
        .broadcast
        .broadcast(WsEvent::NodeCreated { node_id: result.root_node_id })
        .await;

    tracing::info!(root_node_id = result.root_node_id, user = %doc.user, "graph submitted");

    Ok(Json(SubmissionResponse {
        root_node_id: result.root_node_id,
        pool_share_id: result.pool_share_id,
    }))
}

/// `GET /graphs/:id` and `GET /nodes/:id` share the same lookup: a node plus
/// its direct children.
pub async fn get_node(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<NodeResponse>> {
    let tree = state.tree.lock().await;
    let node = tree
        .node(id)
        .ok_or_else(|| ApiError::NotFound(format!("node {id}")))?;
    let children = tree.children(id);
    Ok(Json(NodeResponse::from_node(node, children)))
}
