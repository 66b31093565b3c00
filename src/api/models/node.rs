//! Response DTOs for dispatch-tree nodes and submissions.

use serde::{Deserialize, Serialize};

use crate::model::{Command, CommandStatus, Id, Node};

/// The result of a successful `POST /graphs/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub root_node_id: Id,
    pub pool_share_id: Option<Id>,
}

/// A node in the dispatch tree, folder or leaf, as returned to API callers.
#[derive(Debug, Clone, Serialize)]
pub struct NodeResponse {
    pub id: Id,
    pub name: String,
    pub parent: Option<Id>,
    pub kind: NodeKindResponse,
    pub status: CommandStatus,
    pub priority: i32,
    pub dispatch_key: f64,
    pub max_rn: i32,
    pub user: String,
    pub children: Vec<Id>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKindResponse {
    Folder,
    Task,
}

impl NodeResponse {
    pub fn from_node(node: &Node, children: &[Id]) -> Self {
        let common = node.common();
        Self {
            id: common.id,
            name: common.name.clone(),
            parent: common.parent,
            kind: if node.is_folder() { NodeKindResponse::Folder } else { NodeKindResponse::Task },
            status: common.status,
            priority: common.priority,
            dispatch_key: common.dispatch_key,
            max_rn: common.max_rn,
            user: common.user.clone(),
            children: children.to_vec(),
        }
    }
}

/// A single command under a task node, as returned to API callers.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub id: Id,
    pub task_id: Id,
    pub description: String,
    pub status: CommandStatus,
    pub completion: f32,
    pub assigned_render_node: Option<Id>,
    pub attempt: u32,
    pub message: Option<String>,
}

impl From<&Command> for CommandResponse {
    fn from(cmd: &Command) -> Self {
        Self {
            id: cmd.id,
            task_id: cmd.task_id,
            description: cmd.description.clone(),
            status: cmd.status,
            completion: cmd.completion,
            assigned_render_node: cmd.assigned_render_node,
            attempt: cmd.attempt,
            message: cmd.message.clone(),
        }
    }
}
