//! The submission decoder: turns a `POST /graphs/` wire document into
//! dispatch-tree nodes.
//!
//! Two-pass like `graph_builder::dumper`'s client-side counterpart: first
//! allocate a tree id for every wire node and every command, then link
//! parents/children and dependency edges against that index. The server
//! never trusts the client's own cycle check (`wire.rs` carries no cycle
//! guarantee) and re-runs it here before anything is grafted onto the live
//! tree.

use std::collections::HashMap;

use crate::graph_builder::wire::{NodeKindWire, SubmissionWire};
use crate::model::{
    Command, DependencyEdge, FolderNode, Id, Node, NodeCommon, NodeKind, Pool, PoolShare, Strategy,
    Task, TaskGroup, TaskNode,
};
use crate::tree::DispatchTree;
use crate::{DispatchError, Result};

/// Result of a successful submission: the id of the new subtree's root
/// (grafted under the dispatch tree's root) and the pool share created for
/// it, if the submission requested one.
pub struct SubmissionResult {
    pub root_node_id: Id,
    pub pool_share_id: Option<Id>,
}

/// Decodes and grafts a submission onto `tree`. On any validation or cycle
/// error the tree is left untouched.
pub fn submit(tree: &mut DispatchTree, doc: &SubmissionWire) -> Result<SubmissionResult> {
    validate_shape(doc)?;
    check_cycles(doc)?;

    let mut allocated = allocate_ids(tree, doc);
    let pool_share_id = bind_pool_share(tree, doc, &allocated);

    let root_node_id = build_nodes(tree, doc, doc.root, None, &mut allocated)?;
    link_dependencies(tree, doc, &allocated);

    let leaf_node_ids: Vec<Id> = allocated
        .iter()
        .filter(|a| a.task_id.is_some())
        .map(|a| a.node_id)
        .collect();
    crate::dependency::promote_ready(tree, leaf_node_ids);

    tree.recompute_rollup_from(root_node_id);

    Ok(SubmissionResult {
        root_node_id,
        pool_share_id,
    })
}

fn validate_shape(doc: &SubmissionWire) -> Result<()> {
    if doc.root >= doc.tasks.len() {
        return Err(DispatchError::Validation(format!(
            "root index {} out of range for {} nodes",
            doc.root,
            doc.tasks.len()
        )));
    }
    for (i, node) in doc.tasks.iter().enumerate() {
        for (target, statuses) in &node.dependencies {
            if *target >= doc.tasks.len() {
                return Err(DispatchError::Validation(format!(
                    "node[{i}] dependency targets out-of-range index {target}"
                )));
            }
            if statuses.is_empty() {
                return Err(DispatchError::Validation(format!(
                    "node[{i}] has an empty dependency status set"
                )));
            }
            for s in statuses {
                if crate::model::CommandStatus::from_u8(*s).is_none() {
                    return Err(DispatchError::Validation(format!(
                        "node[{i}] dependency carries unknown status ordinal {s}"
                    )));
                }
            }
        }
        match node.kind {
            NodeKindWire::TaskGroup => {
                let strategy = node.strategy.as_deref().unwrap_or("FIFO");
                strategy
                    .parse::<Strategy>()
                    .map_err(|e| DispatchError::Validation(format!("node[{i}]: {e}")))?;
                for child in node.children.iter().flatten() {
                    if *child >= doc.tasks.len() {
                        return Err(DispatchError::Validation(format!(
                            "node[{i}] references out-of-range child index {child}"
                        )));
                    }
                }
            }
            NodeKindWire::Task => {
                if node.runner.is_none() {
                    return Err(DispatchError::Validation(format!("node[{i}] is a task without a runner")));
                }
            }
        }
    }
    Ok(())
}

/// Re-runs cycle detection over the wire indices directly, before anything
/// is allocated a real tree id. Mirrors `graph_builder::dumper`'s check but
/// operates on `usize` wire indices rather than `model::Id`.
fn check_cycles(doc: &SubmissionWire) -> Result<()> {
    let ids: Vec<Id> = (0..doc.tasks.len() as Id).collect();
    crate::dependency::check_cycles(
        &ids,
        |id| {
            doc.tasks[id as usize]
                .dependencies
                .iter()
                .map(|(target, _)| *target as Id)
                .collect()
        },
        |id| doc.tasks[id as usize].name.clone(),
    )
}

/// Per-wire-index allocation: a real tree id for the node itself, and for a
/// Task node, the ids of its owning `Task` entity and each of its commands.
struct Allocated {
    node_id: Id,
    task_id: Option<Id>,
    command_ids: Vec<Id>,
}

fn allocate_ids(tree: &mut DispatchTree, doc: &SubmissionWire) -> Vec<Allocated> {
    doc.tasks
        .iter()
        .map(|node| match node.kind {
            NodeKindWire::TaskGroup => Allocated {
                node_id: tree.ids_mut().next("FolderNode"),
                task_id: None,
                command_ids: Vec::new(),
            },
            NodeKindWire::Task => {
                let command_count = node.commands.as_ref().map(Vec::len).unwrap_or(0);
                Allocated {
                    node_id: tree.ids_mut().next("TaskNode"),
                    task_id: Some(tree.ids_mut().next("Task")),
                    command_ids: (0..command_count).map(|_| tree.ids_mut().next("Command")).collect(),
                }
            }
        })
        .collect()
}

fn bind_pool_share(tree: &mut DispatchTree, doc: &SubmissionWire, allocated: &[Allocated]) -> Option<Id> {
    if doc.pool_name.is_empty() {
        return None;
    }
    let found_pool_id = tree
        .pools()
        .find(|p| p.name == doc.pool_name && !p.archived)
        .map(|p| p.id);
    let pool_id = match found_pool_id {
        Some(id) => id,
        None => {
            let id = tree.ids_mut().next("Pool");
            tree.insert_pool(Pool::new(id, doc.pool_name.clone()))
        }
    };
    let share_id = tree.ids_mut().next("PoolShare");
    let root_node_id = allocated[doc.root].node_id;
    let share = PoolShare::new(share_id, pool_id, root_node_id, doc.max_rn);
    Some(tree.insert_pool_share(share))
}

/// Builds the node (and, for leaves, the owning Task + its commands)
/// rooted at wire index `idx`, grafting it under `parent` (the tree root if
/// `None`), recursing into TaskGroup children.
fn build_nodes(
    tree: &mut DispatchTree,
    doc: &SubmissionWire,
    idx: usize,
    parent: Option<Id>,
    allocated: &mut [Allocated],
) -> Result<Id> {
    let wire = &doc.tasks[idx];
    let node_id = allocated[idx].node_id;
    let graft_parent = parent.unwrap_or_else(|| tree.root());

    let node = match wire.kind {
        NodeKindWire::TaskGroup => {
            let group_id = tree.ids_mut().next("TaskGroup");
            let strategy: Strategy = wire.strategy.as_deref().unwrap_or("FIFO").parse().unwrap_or(Strategy::Fifo);
            let mut task_group = TaskGroup::new(group_id, wire.name.clone()).with_strategy(strategy);
            task_group.arguments = wire.arguments.clone();
            task_group.environment = wire.environment.clone();
            task_group.requirements = wire.requirements.clone();
            task_group.tags = wire.tags.clone();

            let mut common = NodeCommon::new(node_id, wire.name.clone(), doc.user.clone());
            common.priority = wire.priority;
            common.dispatch_key = wire.dispatch_key;
            common.max_rn = wire.max_rn;

            Node {
                kind: NodeKind::Folder(FolderNode {
                    common,
                    task_group,
                    strategy,
                    children: Vec::new(),
                    rules: HashMap::new(),
                }),
            }
        }
        NodeKindWire::Task => {
            let task_id = allocated[idx].task_id.expect("task node must have an allocated task id");
            let runner = wire.runner.clone().unwrap_or_default();
            let mut task = Task::new(task_id, wire.name.clone(), runner);
            task.arguments = wire.arguments.clone();
            task.environment = wire.environment.clone();
            task.requirements = wire.requirements.clone();
            task.tags = wire.tags.clone();
            task.validation_expression = wire.validation_expression.clone();
            task.min_nb_cores = wire.min_nb_cores.unwrap_or(1);
            task.max_nb_cores = wire.max_nb_cores.unwrap_or(task.min_nb_cores);
            task.ram_use = wire.ram_use.unwrap_or(0);
            task.licence = wire.licence.clone();
            task.timer = wire.timer;
            task.max_attempt = wire.max_attempt.unwrap_or(1);

            let commands: Vec<Command> = wire
                .commands
                .iter()
                .flatten()
                .zip(allocated[idx].command_ids.iter())
                .map(|(cmd_wire, &cmd_id)| {
                    let mut cmd = Command::new(cmd_id, task_id, cmd_wire.description.clone());
                    cmd.arguments = cmd_wire.arguments.clone();
                    cmd
                })
                .collect();
            tree.insert_task(task);
            if !commands.is_empty() {
                tree.set_commands(task_id, commands);
            }

            let mut common = NodeCommon::new(node_id, wire.name.clone(), doc.user.clone());
            common.priority = wire.priority;
            common.dispatch_key = wire.dispatch_key;
            common.max_rn = wire.max_rn;

            Node {
                kind: NodeKind::Task(TaskNode { common, task_id }),
            }
        }
    };

    tree.insert_node(node, graft_parent)?;
    if let Some(rule_name) = wire.rule.clone() {
        tree.bind_rule(graft_parent, rule_name, node_id)?;
    }

    if let NodeKindWire::TaskGroup = wire.kind {
        for &child_idx in wire.children.iter().flatten() {
            build_nodes(tree, doc, child_idx, Some(node_id), allocated)?;
        }
    }

    Ok(node_id)
}

/// Second pass: resolves every wire dependency `(targetIdx, statuses)` into
/// a real `DependencyEdge` against the now-allocated tree ids.
fn link_dependencies(tree: &mut DispatchTree, doc: &SubmissionWire, allocated: &[Allocated]) {
    for (idx, wire) in doc.tasks.iter().enumerate() {
        if wire.dependencies.is_empty() {
            continue;
        }
        let node_id = allocated[idx].node_id;
        let edges: Vec<DependencyEdge> = wire
            .dependencies
            .iter()
            .map(|(target_idx, statuses)| DependencyEdge {
                target: allocated[*target_idx].node_id,
                accepted: statuses
                    .iter()
                    .filter_map(|s| crate::model::CommandStatus::from_u8(*s))
                    .collect(),
            })
            .collect();
        if let Some(node) = tree.node_mut(node_id) {
            node.common_mut().dependencies = edges;
        }
    }
}
