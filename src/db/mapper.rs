//! Persistence mapper: drains the dispatch tree's dirty queues into the
//! database, and rebuilds a tree from the database on restart.
//!
//! Both directions walk the entity classes in `tree::CREATE_ORDER` (Pool,
//! RenderNode, TaskGroup, Task, Command, FolderNode, TaskNode, Rule,
//! PoolShare); restart restore adds a final pass verifying every dependency
//! edge's target actually exists once every class has loaded.

use std::collections::HashMap;

use crate::db::connection::DatabasePool;
use crate::db::error::DbResult;
use crate::db::models::{
    CommandRow, FolderNodeRow, PoolRow, PoolShareRow, RenderNodeRow, RuleRow, TaskGroupRow,
    TaskNodeRow, TaskRow,
};
use crate::db::repositories::{
    CommandRepository, FolderNodeRepository, PoolRepository, PoolShareRepository,
    RenderNodeRepository, RuleRepository, TaskGroupRepository, TaskNodeRepository, TaskRepository,
};
use crate::db::DatabaseError;
use crate::model::{Command, Id, Node, NodeKind, RenderNode, Task, TaskGroup};
use crate::tree::{DispatchTree, EntityRef};

pub struct PersistenceMapper;

impl PersistenceMapper {
    /// Drains the tree's three queues and applies them to `pool` in one
    /// pass each, in `CREATE_ORDER` within the create and modify queues so
    /// foreign keys (a Command's `task_id`, a FolderNode's `task_group_id`)
    /// are always satisfied.
    pub async fn flush(pool: &DatabasePool, tree: &mut DispatchTree) -> DbResult<()> {
        let queues = tree.drain_queues();

        let mut to_create = queues.to_create;
        to_create.sort_by_key(entity_rank);
        for entity in &to_create {
            Self::create_one(pool, tree, entity).await?;
        }

        let mut to_modify = queues.to_modify;
        to_modify.sort_by_key(entity_rank);
        for entity in &to_modify {
            Self::modify_one(pool, tree, entity).await?;
        }

        for entity in &queues.to_archive {
            Self::archive_one(pool, entity).await?;
        }

        Ok(())
    }

    async fn create_one(pool: &DatabasePool, tree: &DispatchTree, entity: &EntityRef) -> DbResult<()> {
        match *entity {
            EntityRef::Pool(id) => {
                if let Some(p) = tree.pool(id) {
                    PoolRepository::create(pool, &PoolRow::from(p)).await?;
                }
            }
            EntityRef::RenderNode(id) => {
                if let Some(rn) = tree.render_node(id) {
                    RenderNodeRepository::create(pool, &RenderNodeRow::from(rn)).await?;
                }
            }
            EntityRef::TaskGroup(id) => {
                if let Some(group) = find_task_group(tree, id) {
                    TaskGroupRepository::create(pool, &TaskGroupRow::from(&group)).await?;
                }
            }
            EntityRef::Task(id) => {
                if let Some(task) = tree.task(id) {
                    TaskRepository::create(pool, &TaskRow::from(task)).await?;
                }
            }
            EntityRef::Command(id) => {
                if let Some(cmd) = tree.command(id) {
                    CommandRepository::create(pool, &CommandRow::from(cmd)).await?;
                }
            }
            EntityRef::FolderNode(id) => {
                if let Some(folder) = tree.node(id).and_then(Node::as_folder) {
                    TaskGroupRepository::create(pool, &TaskGroupRow::from(&folder.task_group)).await?;
                    FolderNodeRepository::create(pool, &FolderNodeRow::from(folder)).await?;
                }
            }
            EntityRef::TaskNode(id) => {
                if let Some(task_node) = tree.node(id).and_then(Node::as_task_node) {
                    TaskNodeRepository::create(pool, &TaskNodeRow::from(task_node)).await?;
                }
            }
            EntityRef::PoolShare(id) => {
                if let Some(share) = tree.pool_share(id) {
                    PoolShareRepository::create(pool, &PoolShareRow::from(share)).await?;
                }
            }
            EntityRef::Rule(id) => {
                if let Some(rule) = tree.rule(id) {
                    RuleRepository::create(pool, &RuleRow::from(rule)).await?;
                }
            }
        }
        Ok(())
    }

    async fn modify_one(pool: &DatabasePool, tree: &DispatchTree, entity: &EntityRef) -> DbResult<()> {
        match *entity {
            EntityRef::Pool(id) => {
                if let Some(p) = tree.pool(id) {
                    PoolRepository::update(pool, &PoolRow::from(p)).await?;
                }
            }
            EntityRef::RenderNode(id) => {
                if let Some(rn) = tree.render_node(id) {
                    RenderNodeRepository::update(pool, &RenderNodeRow::from(rn)).await?;
                }
            }
            EntityRef::TaskGroup(id) => {
                if let Some(group) = find_task_group(tree, id) {
                    TaskGroupRepository::update(pool, &TaskGroupRow::from(&group)).await?;
                }
            }
            EntityRef::Task(id) => {
                if let Some(task) = tree.task(id) {
                    TaskRepository::update(pool, &TaskRow::from(task)).await?;
                }
            }
            EntityRef::Command(id) => {
                if let Some(cmd) = tree.command(id) {
                    CommandRepository::update(pool, &CommandRow::from(cmd)).await?;
                }
            }
            EntityRef::FolderNode(id) => {
                if let Some(folder) = tree.node(id).and_then(Node::as_folder) {
                    FolderNodeRepository::update(pool, &FolderNodeRow::from(folder)).await?;
                }
            }
            EntityRef::TaskNode(id) => {
                if let Some(task_node) = tree.node(id).and_then(Node::as_task_node) {
                    TaskNodeRepository::update(pool, &TaskNodeRow::from(task_node)).await?;
                }
            }
            EntityRef::PoolShare(id) => {
                if let Some(share) = tree.pool_share(id) {
                    PoolShareRepository::update(pool, &PoolShareRow::from(share)).await?;
                }
            }
            // Rules are immutable once bound; there is no column to update.
            EntityRef::Rule(_) => {}
        }
        Ok(())
    }

    /// Archiving only exists for the classes with an `archived` column
    /// (Pool, RenderNode, FolderNode, TaskNode, PoolShare); Task, Command,
    /// TaskGroup and Rule rows are archived implicitly when their owning
    /// node is, so a queued archive for those classes is a no-op here.
    async fn archive_one(pool: &DatabasePool, entity: &EntityRef) -> DbResult<()> {
        match *entity {
            EntityRef::Pool(id) => {
                sqlx::query("UPDATE pools SET archived = 1 WHERE id = ?")
                    .bind(id)
                    .execute(pool)
                    .await?;
            }
            EntityRef::RenderNode(id) => {
                sqlx::query("UPDATE render_nodes SET archived = 1 WHERE id = ?")
                    .bind(id)
                    .execute(pool)
                    .await?;
            }
            EntityRef::FolderNode(id) => {
                sqlx::query("UPDATE folder_nodes SET archived = 1 WHERE id = ?")
                    .bind(id)
                    .execute(pool)
                    .await?;
            }
            EntityRef::TaskNode(id) => {
                sqlx::query("UPDATE task_nodes SET archived = 1 WHERE id = ?")
                    .bind(id)
                    .execute(pool)
                    .await?;
            }
            EntityRef::PoolShare(id) => {
                sqlx::query("UPDATE pool_shares SET archived = 1 WHERE id = ?")
                    .bind(id)
                    .execute(pool)
                    .await?;
            }
            EntityRef::TaskGroup(_) | EntityRef::Task(_) | EntityRef::Command(_) | EntityRef::Rule(_) => {}
        }
        Ok(())
    }

    /// Rebuilds a tree from scratch: bulk loads in `CREATE_ORDER`, then a
    /// final pass confirming every dependency edge resolves.
    pub async fn restore(pool: &DatabasePool) -> DbResult<DispatchTree> {
        let mut tree = DispatchTree::empty();

        let pool_rows = PoolRepository::list(pool).await?;
        let mut max_pool = 0;
        for row in pool_rows {
            max_pool = max_pool.max(row.id);
            tree.restore_pool(row.into());
        }
        tree.ids_mut().observe("Pool", max_pool);

        let rn_rows = RenderNodeRepository::list(pool).await?;
        let mut max_rn = 0;
        for row in rn_rows {
            max_rn = max_rn.max(row.id);
            let rn: RenderNode = row.try_into()?;
            tree.restore_render_node(rn);
        }
        tree.ids_mut().observe("RenderNode", max_rn);

        let group_rows = TaskGroupRepository::list(pool).await?;
        let mut max_group = 0;
        let mut task_groups: HashMap<Id, TaskGroup> = HashMap::new();
        for row in group_rows {
            max_group = max_group.max(row.id);
            let id = row.id;
            let group: TaskGroup = row.try_into()?;
            task_groups.insert(id, group);
        }
        tree.ids_mut().observe("TaskGroup", max_group);

        let task_rows = TaskRepository::list(pool).await?;
        let mut max_task = 0;
        for row in task_rows {
            max_task = max_task.max(row.id);
            let task: Task = row.try_into()?;
            tree.restore_task(task);
        }
        tree.ids_mut().observe("Task", max_task);

        let command_rows = CommandRepository::list(pool).await?;
        let mut max_command = 0;
        let mut commands_by_task: HashMap<Id, Vec<Command>> = HashMap::new();
        for row in command_rows {
            max_command = max_command.max(row.id);
            let task_id = row.task_id;
            let cmd: Command = row.try_into()?;
            commands_by_task.entry(task_id).or_default().push(cmd);
        }
        tree.ids_mut().observe("Command", max_command);
        for (task_id, commands) in commands_by_task {
            tree.restore_commands(task_id, commands);
        }

        let folder_rows = FolderNodeRepository::list(pool).await?;
        let task_node_rows = TaskNodeRepository::list(pool).await?;
        let max_folder = folder_rows.iter().map(|r| r.id).max().unwrap_or(0);
        let max_task_node = task_node_rows.iter().map(|r| r.id).max().unwrap_or(0);
        restore_nodes(&mut tree, folder_rows, task_node_rows, &task_groups)?;
        tree.ids_mut().observe("FolderNode", max_folder);
        tree.ids_mut().observe("TaskNode", max_task_node);

        let share_rows = PoolShareRepository::list(pool).await?;
        let mut max_share = 0;
        for row in share_rows {
            max_share = max_share.max(row.id);
            tree.restore_pool_share(row.into());
        }
        tree.ids_mut().observe("PoolShare", max_share);

        let rule_rows = RuleRepository::list(pool).await?;
        let mut max_rule = 0;
        for row in rule_rows {
            max_rule = max_rule.max(row.id);
            tree.restore_rule(row.into());
        }
        tree.ids_mut().observe("Rule", max_rule);

        tree.verify_dependency_targets()?;

        Ok(tree)
    }
}

/// Either half of the node hierarchy, pending insertion until its parent
/// (or nothing, for the root) is already grafted.
enum PendingNode {
    Folder(FolderNodeRow),
    Task(TaskNodeRow),
}

impl PendingNode {
    fn parent(&self) -> Option<Id> {
        match self {
            PendingNode::Folder(r) => r.parent,
            PendingNode::Task(r) => r.parent,
        }
    }
}

/// Inserts folder and task nodes in parent-before-child order regardless of
/// the order the two table scans returned them in.
fn restore_nodes(
    tree: &mut DispatchTree,
    folder_rows: Vec<FolderNodeRow>,
    task_node_rows: Vec<TaskNodeRow>,
    task_groups: &HashMap<Id, TaskGroup>,
) -> DbResult<()> {
    let mut pending: Vec<PendingNode> = folder_rows
        .into_iter()
        .map(PendingNode::Folder)
        .chain(task_node_rows.into_iter().map(PendingNode::Task))
        .collect();

    while !pending.is_empty() {
        let before = pending.len();
        let mut next_round = Vec::with_capacity(pending.len());
        for pending_node in pending {
            let ready = match pending_node.parent() {
                None => true,
                Some(parent_id) => tree.node(parent_id).is_some(),
            };
            if !ready {
                next_round.push(pending_node);
                continue;
            }
            let node = match pending_node {
                PendingNode::Folder(row) => {
                    let task_group_id = row.task_group_id;
                    let strategy = row.strategy()?;
                    let task_group = task_groups.get(&task_group_id).cloned().ok_or_else(|| {
                        DatabaseError::not_found(format!("task group {task_group_id}"))
                    })?;
                    let common = row.into_common()?;
                    Node {
                        kind: NodeKind::Folder(crate::model::FolderNode {
                            common,
                            task_group,
                            strategy,
                            children: Vec::new(),
                            rules: HashMap::new(),
                        }),
                    }
                }
                PendingNode::Task(row) => {
                    let task_node: crate::model::TaskNode = row.try_into()?;
                    Node {
                        kind: NodeKind::Task(task_node),
                    }
                }
            };
            tree.restore_node(node);
        }
        if next_round.len() == before {
            return Err(DatabaseError::type_error(
                "dangling parent reference while restoring the dispatch tree",
            ));
        }
        pending = next_round;
    }
    Ok(())
}

fn find_task_group(tree: &DispatchTree, id: Id) -> Option<TaskGroup> {
    tree.nodes()
        .filter_map(Node::as_folder)
        .find(|f| f.task_group.id == id)
        .map(|f| f.task_group.clone())
}

/// Orders a mixed batch of `EntityRef`s by `tree::CREATE_ORDER`.
fn entity_rank(entity: &EntityRef) -> usize {
    let class = match entity {
        EntityRef::Pool(_) => "Pool",
        EntityRef::RenderNode(_) => "RenderNode",
        EntityRef::TaskGroup(_) => "TaskGroup",
        EntityRef::Task(_) => "Task",
        EntityRef::Command(_) => "Command",
        EntityRef::FolderNode(_) => "FolderNode",
        EntityRef::TaskNode(_) => "TaskNode",
        EntityRef::Rule(_) => "Rule",
        EntityRef::PoolShare(_) => "PoolShare",
    };
    crate::tree::CREATE_ORDER
        .iter()
        .position(|c| *c == class)
        .unwrap_or(usize::MAX)
}
