//! `Node`: the scheduling identity overlaid on a Task or TaskGroup.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::status::NodeStatus;
use super::task::{Strategy, TaskGroup};
use super::Id;

/// A dependency edge: ready only once `target`'s status is in `accepted`.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub target: Id,
    pub accepted: Vec<NodeStatus>,
}

impl DependencyEdge {
    pub fn satisfied_by(&self, target_status: NodeStatus) -> bool {
        self.accepted.contains(&target_status)
    }
}

/// A named child slot binding a name to either a FolderNode or a TaskNode.
/// Durable counterpart of [`FolderNode::rules`]'s entries: restoring a tree
/// replays every `Rule` row to rebuild those maps from the child's own
/// `task_node_id`/`folder_node_id`, rather than storing the owning folder
/// directly (the owner is whichever folder the referenced child's `parent`
/// points to).
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: Id,
    pub name: String,
    pub task_node_id: Option<Id>,
    pub folder_node_id: Option<Id>,
}

impl Rule {
    pub fn for_folder(id: Id, name: impl Into<String>, folder_node_id: Id) -> Self {
        Self {
            id,
            name: name.into(),
            task_node_id: None,
            folder_node_id: Some(folder_node_id),
        }
    }

    pub fn for_task_node(id: Id, name: impl Into<String>, task_node_id: Id) -> Self {
        Self {
            id,
            name: name.into(),
            task_node_id: Some(task_node_id),
            folder_node_id: None,
        }
    }

    /// The child node this rule names, regardless of which kind it is.
    pub fn child_id(&self) -> Id {
        self.folder_node_id.or(self.task_node_id).expect("rule carries exactly one of the two ids")
    }
}

/// Fields shared by every node regardless of kind.
#[derive(Debug, Clone)]
pub struct NodeCommon {
    pub id: Id,
    pub name: String,
    pub parent: Option<Id>,
    pub user: String,
    pub priority: i32,
    /// Higher runs earlier.
    pub dispatch_key: f64,
    /// -1 = unlimited.
    pub max_rn: i32,
    pub creation_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub update_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub archived: bool,
    pub dependencies: Vec<DependencyEdge>,
    pub status: NodeStatus,
}

impl NodeCommon {
    pub fn new(id: Id, name: impl Into<String>, user: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            parent: None,
            user: user.into(),
            priority: 0,
            dispatch_key: 0.0,
            max_rn: -1,
            creation_time: now,
            start_time: None,
            update_time: now,
            end_time: None,
            archived: false,
            dependencies: Vec::new(),
            status: NodeStatus::Blocked,
        }
    }
}

/// A folder overlays a TaskGroup and owns an ordered sequence of children.
#[derive(Debug, Clone)]
pub struct FolderNode {
    pub common: NodeCommon,
    pub task_group: TaskGroup,
    pub strategy: Strategy,
    pub children: Vec<Id>,
    /// Named child slots, a subset of `children` addressable by name
    /// instead of position. Durable counterpart is a [`Rule`] row per entry.
    pub rules: HashMap<String, Id>,
}

/// A leaf node overlays a single Task, identified by id in the owning tree's
/// task arena.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub common: NodeCommon,
    pub task_id: Id,
}

/// Polymorphic node kind: either a `FolderNode` or a `TaskNode`.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Folder(FolderNode),
    Task(TaskNode),
}

/// A node in the dispatch tree: either kind, addressed uniformly by id.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
}

impl Node {
    pub fn common(&self) -> &NodeCommon {
        match &self.kind {
            NodeKind::Folder(f) => &f.common,
            NodeKind::Task(t) => &t.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut NodeCommon {
        match &mut self.kind {
            NodeKind::Folder(f) => &mut f.common,
            NodeKind::Task(t) => &mut t.common,
        }
    }

    pub fn id(&self) -> Id {
        self.common().id
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder(_))
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match &self.kind {
            NodeKind::Folder(f) => Some(f),
            NodeKind::Task(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut FolderNode> {
        match &mut self.kind {
            NodeKind::Folder(f) => Some(f),
            NodeKind::Task(_) => None,
        }
    }

    pub fn as_task_node(&self) -> Option<&TaskNode> {
        match &self.kind {
            NodeKind::Task(t) => Some(t),
            NodeKind::Folder(_) => None,
        }
    }
}

/// The flattened argument map a node presents for serialization: own map
/// only, per the HierarchicalDict invariant (ancestors never copied down).
pub fn own_arguments(node: &NodeKind) -> HashMap<String, String> {
    match node {
        NodeKind::Folder(f) => f.task_group.arguments.clone(),
        NodeKind::Task(_) => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_edge_checks_membership_in_accepted_set() {
        let edge = DependencyEdge {
            target: 1,
            accepted: vec![NodeStatus::Done],
        };
        assert!(edge.satisfied_by(NodeStatus::Done));
        assert!(!edge.satisfied_by(NodeStatus::Error));
    }

    #[test]
    fn new_node_common_starts_blocked_with_unlimited_quota() {
        let common = NodeCommon::new(1, "root", "alice");
        assert_eq!(common.status, NodeStatus::Blocked);
        assert_eq!(common.max_rn, -1);
        assert!(common.parent.is_none());
        assert!(!common.archived);
    }
}
