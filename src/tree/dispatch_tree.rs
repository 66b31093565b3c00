//! The authoritative in-memory dispatch tree.
//!
//! A single writer owns this structure; it is an arena keyed by per-class
//! integer id, a parent/child tree plus the render-node/pool/licence side
//! tables the assignment loop and persistence layer need.

use std::collections::HashMap;

use crate::model::{
    rollup, Command, CommandStatus, FolderNode, Id, Node, NodeCommon, NodeKind, Pool, PoolShare,
    RenderNode, Rule, Task, TaskGroup, TaskNode,
};
use crate::tree::IdAllocator;
use crate::{DispatchError, Result};

/// Reference to a persisted entity, used by the three dirty queues the
/// persistence mapper drains between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Pool(Id),
    RenderNode(Id),
    TaskGroup(Id),
    Task(Id),
    Command(Id),
    FolderNode(Id),
    TaskNode(Id),
    Rule(Id),
    PoolShare(Id),
}

/// The three operation queues the dispatch tree maintains for the
/// persistence layer, drained in create-order (Pools, RenderNodes,
/// TaskGroups, Tasks, Commands, FolderNodes, TaskNodes, Rules, PoolShares)
/// or archive-order (reverse).
#[derive(Debug, Default)]
pub struct PersistenceQueues {
    pub to_create: Vec<EntityRef>,
    pub to_modify: Vec<EntityRef>,
    pub to_archive: Vec<EntityRef>,
}

impl PersistenceQueues {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_modify.is_empty() && self.to_archive.is_empty()
    }
}

/// Order used to group a drain batch by entity class, matching the foreign
/// key dependency order of the schema (a Command needs its Task to exist
/// first, a TaskNode needs its parent FolderNode, a Rule needs the
/// FolderNode/TaskNode it names, and so on).
pub const CREATE_ORDER: &[&str] = &[
    "Pool",
    "RenderNode",
    "TaskGroup",
    "Task",
    "Command",
    "FolderNode",
    "TaskNode",
    "Rule",
    "PoolShare",
];

pub struct DispatchTree {
    ids: IdAllocator,
    nodes: HashMap<Id, Node>,
    tasks: HashMap<Id, Task>,
    /// command id -> owning task id, for O(1) command lookup.
    command_owner: HashMap<Id, Id>,
    render_nodes: HashMap<Id, RenderNode>,
    pools: HashMap<Id, Pool>,
    pool_shares: HashMap<Id, PoolShare>,
    rules: HashMap<Id, Rule>,
    root: Id,
    queues: PersistenceQueues,
}

impl DispatchTree {
    /// A fresh tree with just a root FolderNode.
    pub fn new() -> Self {
        let mut ids = IdAllocator::new();
        let root_id = ids.next("FolderNode");
        let task_group_id = ids.next("TaskGroup");
        let root = FolderNode {
            common: NodeCommon::new(root_id, "root", "system"),
            task_group: crate::model::TaskGroup::new(task_group_id, "root"),
            strategy: crate::model::Strategy::Fifo,
            children: Vec::new(),
            rules: HashMap::new(),
        };
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id,
            Node {
                kind: NodeKind::Folder(root),
            },
        );
        let mut tree = Self {
            ids,
            nodes,
            tasks: HashMap::new(),
            command_owner: HashMap::new(),
            render_nodes: HashMap::new(),
            pools: HashMap::new(),
            pool_shares: HashMap::new(),
            rules: HashMap::new(),
            root: root_id,
            queues: PersistenceQueues::default(),
        };
        tree.queues.to_create.push(EntityRef::FolderNode(root_id));
        tree
    }

    pub fn root(&self) -> Id {
        self.root
    }

    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn queues_mut(&mut self) -> &mut PersistenceQueues {
        &mut self.queues
    }

    /// Drains all three queues, leaving them empty. Called by the
    /// persistence mapper once its transaction commits.
    pub fn drain_queues(&mut self) -> PersistenceQueues {
        std::mem::take(&mut self.queues)
    }

    // ---- nodes -----------------------------------------------------------

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Attaches `node` as a child of `parent`, queuing it for creation.
    pub fn insert_node(&mut self, mut node: Node, parent: Id) -> Result<Id> {
        if !self.nodes.contains_key(&parent) {
            return Err(DispatchError::NotFound(format!("parent node {parent}")));
        }
        let parent_node = self.nodes.get(&parent).unwrap();
        if !parent_node.is_folder() {
            return Err(DispatchError::Validation(format!(
                "node {parent} is a TaskNode and cannot host children"
            )));
        }
        let id = node.id();
        node.common_mut().parent = Some(parent);
        let create_ref = match &node.kind {
            NodeKind::Folder(_) => EntityRef::FolderNode(id),
            NodeKind::Task(_) => EntityRef::TaskNode(id),
        };
        self.nodes.insert(id, node);
        if let Some(parent_node) = self.nodes.get_mut(&parent).and_then(Node::as_folder_mut) {
            parent_node.children.push(id);
        }
        self.queues.to_create.push(create_ref);
        Ok(id)
    }

    pub fn children(&self, id: Id) -> &[Id] {
        self.nodes
            .get(&id)
            .and_then(Node::as_folder)
            .map(|f| f.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: Id) -> Option<Id> {
        self.nodes.get(&id).and_then(|n| n.common().parent)
    }

    // ---- tasks & commands --------------------------------------------------

    pub fn insert_task(&mut self, task: Task) -> Id {
        let id = task.id;
        self.tasks.insert(id, task);
        self.queues.to_create.push(EntityRef::Task(id));
        id
    }

    pub fn task(&self, id: Id) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: Id) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Replaces a task's commands wholesale (decomposition) and indexes
    /// each for direct lookup.
    pub fn set_commands(&mut self, task_id: Id, commands: Vec<Command>) {
        for cmd in &commands {
            self.command_owner.insert(cmd.id, task_id);
            self.queues.to_create.push(EntityRef::Command(cmd.id));
        }
        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.commands = commands;
            task.decomposed = true;
        }
    }

    pub fn command(&self, id: Id) -> Option<&Command> {
        let task_id = self.command_owner.get(&id)?;
        self.tasks
            .get(task_id)?
            .commands
            .iter()
            .find(|c| c.id == id)
    }

    pub fn command_mut(&mut self, id: Id) -> Option<&mut Command> {
        let task_id = *self.command_owner.get(&id)?;
        self.tasks
            .get_mut(&task_id)?
            .commands
            .iter_mut()
            .find(|c| c.id == id)
    }

    pub fn commands_of(&self, task_id: Id) -> &[Command] {
        self.tasks
            .get(&task_id)
            .map(|t| t.commands.as_slice())
            .unwrap_or(&[])
    }

    /// Every command anywhere in the tree currently at `status`, for passes
    /// that scan across tasks rather than within one (the assignment tick's
    /// candidate sweep, the local `Graph::execute` runner).
    pub fn commands_with_status(&self, status: CommandStatus) -> Vec<Id> {
        self.tasks
            .values()
            .flat_map(|t| t.commands.iter())
            .filter(|c| c.status == status)
            .map(|c| c.id)
            .collect()
    }

    /// `task_node_id`'s owning Task's own arguments merged with the
    /// arguments inherited from every ancestor TaskGroup, root-first so a
    /// closer TaskGroup (or the Task itself) overrides an ancestor's value.
    /// Mirrors `model::HierarchicalDict::flatten`'s override order, walking
    /// the tree's live parent chain directly rather than a separate Arc
    /// graph, since every FolderNode already carries its own TaskGroup
    /// inline.
    pub fn flattened_arguments(&self, task_node_id: Id) -> HashMap<String, String> {
        self.flatten_inherited(task_node_id, |tg| &tg.arguments, |t| &t.arguments)
    }

    /// Same inheritance rule as [`Self::flattened_arguments`], over
    /// environment variables instead.
    pub fn flattened_environment(&self, task_node_id: Id) -> HashMap<String, String> {
        self.flatten_inherited(task_node_id, |tg| &tg.environment, |t| &t.environment)
    }

    fn flatten_inherited(
        &self,
        task_node_id: Id,
        group_map: impl Fn(&TaskGroup) -> &HashMap<String, String>,
        task_map: impl Fn(&Task) -> &HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut ancestors = Vec::new();
        let mut cursor = self.parent(task_node_id);
        while let Some(id) = cursor {
            if let Some(folder) = self.nodes.get(&id).and_then(Node::as_folder) {
                ancestors.push(folder);
            }
            cursor = self.parent(id);
        }

        let mut flattened = HashMap::new();
        for folder in ancestors.into_iter().rev() {
            flattened.extend(group_map(&folder.task_group).clone());
        }
        if let Some(task) = self
            .node(task_node_id)
            .and_then(Node::as_task_node)
            .and_then(|t| self.task(t.task_id))
        {
            flattened.extend(task_map(task).clone());
        }
        flattened
    }

    /// Marks a command dirty for the next persistence drain.
    pub fn touch_command(&mut self, id: Id) {
        self.queues.to_modify.push(EntityRef::Command(id));
    }

    pub fn touch_node(&mut self, id: Id) {
        if let Some(node) = self.nodes.get(&id) {
            let entity = match &node.kind {
                NodeKind::Folder(_) => EntityRef::FolderNode(id),
                NodeKind::Task(_) => EntityRef::TaskNode(id),
            };
            self.queues.to_modify.push(entity);
        }
    }

    /// Finds the TaskNode id owning `task_id`, if any.
    pub fn task_node_for(&self, task_id: Id) -> Option<Id> {
        self.nodes.values().find_map(|n| match &n.kind {
            NodeKind::Task(t) if t.task_id == task_id => Some(t.common.id),
            _ => None,
        })
    }

    // ---- render nodes / pools / shares -------------------------------------

    pub fn insert_render_node(&mut self, rn: RenderNode) -> Id {
        let id = rn.id;
        self.render_nodes.insert(id, rn);
        self.queues.to_create.push(EntityRef::RenderNode(id));
        id
    }

    pub fn render_node(&self, id: Id) -> Option<&RenderNode> {
        self.render_nodes.get(&id)
    }

    pub fn render_node_mut(&mut self, id: Id) -> Option<&mut RenderNode> {
        self.render_nodes.get_mut(&id)
    }

    pub fn render_nodes(&self) -> impl Iterator<Item = &RenderNode> {
        self.render_nodes.values()
    }

    pub fn insert_pool(&mut self, pool: Pool) -> Id {
        let id = pool.id;
        self.pools.insert(id, pool);
        self.queues.to_create.push(EntityRef::Pool(id));
        id
    }

    pub fn pool(&self, id: Id) -> Option<&Pool> {
        self.pools.get(&id)
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn insert_pool_share(&mut self, share: PoolShare) -> Id {
        let id = share.id;
        self.pool_shares.insert(id, share);
        self.queues.to_create.push(EntityRef::PoolShare(id));
        id
    }

    pub fn pool_shares(&self) -> impl Iterator<Item = &PoolShare> {
        self.pool_shares.values()
    }

    pub fn pool_share(&self, id: Id) -> Option<&PoolShare> {
        self.pool_shares.get(&id)
    }

    // ---- rules (named child slots) -----------------------------------------

    /// Names `child_id` as `name` under `parent_folder_id`, so it can later
    /// be looked up by name rather than by position in `children`. `name`
    /// need not match the child's own display name. `child_id` must already
    /// be a child of `parent_folder_id`.
    pub fn bind_rule(&mut self, parent_folder_id: Id, name: impl Into<String>, child_id: Id) -> Result<Id> {
        let name = name.into();
        let child_is_folder = match self.nodes.get(&child_id) {
            Some(node) => node.is_folder(),
            None => return Err(DispatchError::NotFound(format!("child node {child_id}"))),
        };
        if !self.children(parent_folder_id).contains(&child_id) {
            return Err(DispatchError::Validation(format!(
                "node {child_id} is not a child of folder {parent_folder_id}"
            )));
        }

        let rule_id = self.ids.next("Rule");
        let rule = if child_is_folder {
            Rule::for_folder(rule_id, name.clone(), child_id)
        } else {
            Rule::for_task_node(rule_id, name.clone(), child_id)
        };
        self.rules.insert(rule_id, rule);
        self.queues.to_create.push(EntityRef::Rule(rule_id));

        if let Some(parent) = self.nodes.get_mut(&parent_folder_id).and_then(Node::as_folder_mut) {
            parent.rules.insert(name, child_id);
        }
        Ok(rule_id)
    }

    pub fn rule(&self, id: Id) -> Option<&Rule> {
        self.rules.get(&id)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// Resolves a named child slot on `parent_folder_id`, or `None` if no
    /// rule was ever bound under that name.
    pub fn child_by_rule(&self, parent_folder_id: Id, name: &str) -> Option<Id> {
        self.nodes
            .get(&parent_folder_id)
            .and_then(Node::as_folder)
            .and_then(|f| f.rules.get(name))
            .copied()
    }

    // ---- status rollup -----------------------------------------------------

    /// The rolled-up status of a node: for a TaskNode, the rollup of its
    /// task's commands; for a FolderNode, the rollup of its children's
    /// current (already-computed) statuses.
    pub fn compute_status(&self, id: Id) -> CommandStatus {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Task(t)) => {
                rollup(self.commands_of(t.task_id).iter().map(|c| c.status))
            }
            Some(NodeKind::Folder(f)) => {
                rollup(f.children.iter().filter_map(|c| self.nodes.get(c)).map(|n| n.common().status))
            }
            None => CommandStatus::Done,
        }
    }

    /// Recomputes `id`'s rollup status and walks up through every ancestor,
    /// recomputing each in turn, since a leaf's change can change every
    /// ancestor's rollup. Updates start/end timestamps and queues each
    /// changed node for persistence.
    pub fn recompute_rollup_from(&mut self, id: Id) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let new_status = self.compute_status(current);
            let (changed, parent) = {
                let Some(node) = self.nodes.get_mut(&current) else {
                    break;
                };
                let common = node.common_mut();
                let changed = common.status != new_status;
                common.status = new_status;
                let now = chrono::Utc::now();
                if new_status == CommandStatus::Running && common.start_time.is_none() {
                    common.start_time = Some(now);
                }
                if matches!(new_status, CommandStatus::Done | CommandStatus::Canceled)
                    && common.end_time.is_none()
                {
                    common.end_time = Some(now);
                }
                if changed {
                    common.update_time = now;
                }
                (changed, common.parent)
            };
            if changed {
                self.touch_node(current);
            }
            cursor = parent;
        }
    }
}

impl Default for DispatchTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Restart restore: an empty tree plus bypasses that graft already loaded
/// rows without re-triggering the persistence queues they came from.
impl DispatchTree {
    pub fn empty() -> Self {
        Self {
            ids: IdAllocator::new(),
            nodes: HashMap::new(),
            tasks: HashMap::new(),
            command_owner: HashMap::new(),
            render_nodes: HashMap::new(),
            pools: HashMap::new(),
            pool_shares: HashMap::new(),
            rules: HashMap::new(),
            root: 0,
            queues: PersistenceQueues::default(),
        }
    }

    /// Grafts an already-persisted node. Nodes must be restored in an order
    /// where every parent precedes its children; a node with no parent
    /// becomes the tree's root.
    pub fn restore_node(&mut self, node: Node) {
        let id = node.id();
        match node.common().parent {
            Some(parent) => {
                self.nodes.insert(id, node);
                if let Some(parent_node) = self.nodes.get_mut(&parent).and_then(Node::as_folder_mut) {
                    parent_node.children.push(id);
                }
            }
            None => {
                self.root = id;
                self.nodes.insert(id, node);
            }
        }
    }

    pub fn restore_task(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    pub fn restore_commands(&mut self, task_id: Id, commands: Vec<Command>) {
        for cmd in &commands {
            self.command_owner.insert(cmd.id, task_id);
        }
        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.decomposed = !commands.is_empty();
            task.commands = commands;
        }
    }

    pub fn restore_render_node(&mut self, rn: RenderNode) {
        self.render_nodes.insert(rn.id, rn);
    }

    pub fn restore_pool(&mut self, pool: Pool) {
        self.pools.insert(pool.id, pool);
    }

    pub fn restore_pool_share(&mut self, share: PoolShare) {
        self.pool_shares.insert(share.id, share);
    }

    /// Binds `rule` onto whichever folder owns its named child, by looking
    /// up that child's own `parent` (already loaded by the time rules are
    /// restored, per restore pass ordering). A rule whose child was pruned
    /// before restore (dangling reference) is silently dropped rather than
    /// failing the whole restore, since it names a child slot only and
    /// carries no scheduling-relevant state of its own.
    pub fn restore_rule(&mut self, rule: Rule) {
        let child_id = rule.child_id();
        let Some(owner) = self.parent(child_id) else {
            return;
        };
        if let Some(folder) = self.nodes.get_mut(&owner).and_then(Node::as_folder_mut) {
            folder.rules.insert(rule.name.clone(), child_id);
        }
        self.rules.insert(rule.id, rule);
    }

    /// Every dependency edge in the tree points at a target by raw id;
    /// verifies each target actually exists after a restore, once every
    /// entity class has been loaded.
    pub fn verify_dependency_targets(&self) -> Result<()> {
        for node in self.nodes.values() {
            for edge in &node.common().dependencies {
                if !self.nodes.contains_key(&edge.target) {
                    return Err(DispatchError::NotFound(format!(
                        "dependency target {} referenced by node {} does not exist",
                        edge.target,
                        node.id()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeCommon, Strategy, TaskGroup};

    fn make_task_node(tree: &mut DispatchTree, task: Task) -> Id {
        let task_id = tree.insert_task(task);
        let node_id = tree.ids_mut().next("TaskNode");
        let node = Node {
            kind: NodeKind::Task(TaskNode {
                common: NodeCommon::new(node_id, "task-node", "alice"),
                task_id,
            }),
        };
        tree.insert_node(node, tree.root()).unwrap();
        node_id
    }

    #[test]
    fn fresh_tree_has_only_its_root() {
        let tree = DispatchTree::new();
        assert!(tree.node(tree.root()).unwrap().is_folder());
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn rollup_propagates_from_command_to_root() {
        let mut tree = DispatchTree::new();
        let task = Task::new(1, "render", "maya_batch");
        let node_id = make_task_node(&mut tree, task);
        let task_id = tree
            .node(node_id)
            .and_then(Node::as_task_node)
            .unwrap()
            .task_id;

        let cmd = Command::new(1, task_id, "echo hi");
        tree.set_commands(task_id, vec![cmd]);

        assert_eq!(tree.compute_status(node_id), CommandStatus::Blocked);

        tree.command_mut(1).unwrap().mark_ready().unwrap();
        tree.recompute_rollup_from(node_id);
        assert_eq!(tree.node(node_id).unwrap().common().status, CommandStatus::Ready);
        assert_eq!(tree.node(tree.root()).unwrap().common().status, CommandStatus::Ready);

        tree.command_mut(1).unwrap().bind(99).unwrap();
        tree.recompute_rollup_from(node_id);
        assert_eq!(tree.node(tree.root()).unwrap().common().status, CommandStatus::Running);
        assert!(tree.node(node_id).unwrap().common().start_time.is_some());

        tree.command_mut(1).unwrap().complete().unwrap();
        tree.recompute_rollup_from(node_id);
        assert_eq!(tree.node(tree.root()).unwrap().common().status, CommandStatus::Done);
        assert!(tree.node(node_id).unwrap().common().end_time.is_some());
    }

    #[test]
    fn cannot_attach_children_under_a_task_node() {
        let mut tree = DispatchTree::new();
        let task = Task::new(1, "render", "maya_batch");
        let node_id = make_task_node(&mut tree, task);

        let folder_id = tree.ids_mut().next("FolderNode");
        let group_id = tree.ids_mut().next("TaskGroup");
        let folder = Node {
            kind: NodeKind::Folder(FolderNode {
                common: NodeCommon::new(folder_id, "nested", "alice"),
                task_group: TaskGroup::new(group_id, "nested"),
                strategy: Strategy::Fifo,
                children: Vec::new(),
                rules: HashMap::new(),
            }),
        };
        assert!(tree.insert_node(folder, node_id).is_err());
    }

    #[test]
    fn flattened_arguments_merge_ancestor_groups_and_the_task_own_map() {
        let mut tree = DispatchTree::new();

        let group_id = tree.ids_mut().next("FolderNode");
        let task_group_id = tree.ids_mut().next("TaskGroup");
        let mut task_group = TaskGroup::new(task_group_id, "shot010");
        task_group.arguments.insert("scene".to_string(), "default.ma".to_string());
        task_group.arguments.insert("renderer".to_string(), "arnold".to_string());
        task_group.environment.insert("PATH".to_string(), "/usr/bin".to_string());
        let folder = Node {
            kind: NodeKind::Folder(FolderNode {
                common: NodeCommon::new(group_id, "shot010", "alice"),
                task_group,
                strategy: Strategy::Fifo,
                children: Vec::new(),
                rules: HashMap::new(),
            }),
        };
        let group_node_id = tree.insert_node(folder, tree.root()).unwrap();

        let mut task = Task::new(1, "render", "maya_batch");
        task.arguments.insert("scene".to_string(), "shot010.ma".to_string());
        let task_id = tree.insert_task(task);
        let node_id = tree.ids_mut().next("TaskNode");
        let node = Node {
            kind: NodeKind::Task(TaskNode {
                common: NodeCommon::new(node_id, "frame-1", "alice"),
                task_id,
            }),
        };
        tree.insert_node(node, group_node_id).unwrap();

        let arguments = tree.flattened_arguments(node_id);
        assert_eq!(arguments.get("scene").map(String::as_str), Some("shot010.ma"));
        assert_eq!(arguments.get("renderer").map(String::as_str), Some("arnold"));

        let environment = tree.flattened_environment(node_id);
        assert_eq!(environment.get("PATH").map(String::as_str), Some("/usr/bin"));
    }

    #[test]
    fn a_rule_resolves_a_named_child_by_name_not_position() {
        let mut tree = DispatchTree::new();
        let task = Task::new(1, "comp", "nuke_batch");
        let node_id = make_task_node(&mut tree, task);

        let rule_id = tree.bind_rule(tree.root(), "main", node_id).unwrap();

        assert_eq!(tree.child_by_rule(tree.root(), "main"), Some(node_id));
        assert_eq!(tree.child_by_rule(tree.root(), "missing"), None);
        assert_eq!(tree.rule(rule_id).unwrap().task_node_id, Some(node_id));
    }

    #[test]
    fn binding_a_rule_for_a_node_that_is_not_a_child_fails() {
        let mut tree = DispatchTree::new();
        let task = Task::new(1, "comp", "nuke_batch");
        let node_id = make_task_node(&mut tree, task);

        let other_folder_id = tree.ids_mut().next("FolderNode");
        let other_group_id = tree.ids_mut().next("TaskGroup");
        let other = Node {
            kind: NodeKind::Folder(FolderNode {
                common: NodeCommon::new(other_folder_id, "elsewhere", "alice"),
                task_group: TaskGroup::new(other_group_id, "elsewhere"),
                strategy: Strategy::Fifo,
                children: Vec::new(),
                rules: HashMap::new(),
            }),
        };
        tree.insert_node(other, tree.root()).unwrap();

        assert!(tree.bind_rule(other_folder_id, "main", node_id).is_err());
    }
}
