//! The dependency engine: BLOCKED→READY promotion, CANCELED propagation on
//! an unsatisfiable dependency, and submission-time cycle detection.
//!
//! Hierarchical lowering of TaskGroup-level dependencies down to leaf tasks
//! happens once, at submission time (`graph_builder::dumper`); this module
//! only ever walks a flat edge list per leaf.

use std::collections::{HashMap, HashSet};

use crate::model::{CommandStatus, DependencyEdge, Id, NodeKind};
use crate::tree::DispatchTree;
use crate::{DispatchError, Result};

/// Re-evaluates every BLOCKED command whose owning TaskNode has a dependency
/// on `changed_node`, promoting to READY when all edges are satisfied, and
/// propagating CANCELED when an edge can never be satisfied again (its
/// target is terminal but outside the accepted set). A promotion or
/// cancellation is itself a status change, so it is fed back into the same
/// scan until nothing further moves: a dependency chain A→B→C unblocks in
/// one call rather than needing a separate trigger per hop.
///
/// Returns the ids of TaskNodes (and, for a cancellation, every descendant
/// it took down with it) whose command(s) were promoted or canceled, so the
/// caller can use them for logging or further bookkeeping; rollups for every
/// touched node are already recomputed before this returns.
pub fn evaluate(tree: &mut DispatchTree, changed_node: Id) -> Vec<Id> {
    let mut affected = Vec::new();
    let mut frontier = vec![changed_node];
    let mut queued: HashSet<Id> = HashSet::new();

    while let Some(current) = frontier.pop() {
        let candidates: Vec<Id> = tree
            .nodes()
            .filter_map(|n| match &n.kind {
                NodeKind::Task(t) if depends_on(&t.common.dependencies, current) => {
                    Some(t.common.id)
                }
                _ => None,
            })
            .collect();

        for node_id in candidates {
            let moved = try_promote(tree, node_id);
            if moved.is_empty() {
                continue;
            }
            affected.extend(moved.iter().copied());
            for id in moved {
                if queued.insert(id) {
                    frontier.push(id);
                }
            }
        }
    }

    affected
}

/// Drives the same per-node promotion/cancellation step `evaluate` runs from
/// a changed-node scan, but directly over `node_ids`. Used at submission
/// time so a freshly grafted subtree's zero-dependency leaves (resolving an
/// empty edge list trivially satisfies every edge) go straight to READY
/// without waiting for an unrelated status change to prime `evaluate`; edges
/// that already target a pre-existing terminal node resolve the same way.
/// Every promotion also re-primes `evaluate` from that node, so dependency
/// edges pointing at other nodes within the same submission resolve
/// regardless of the order they were created in.
pub fn promote_ready(tree: &mut DispatchTree, node_ids: impl IntoIterator<Item = Id>) -> Vec<Id> {
    let mut affected = Vec::new();
    for node_id in node_ids {
        let moved = try_promote(tree, node_id);
        if moved.is_empty() {
            continue;
        }
        affected.extend(moved.iter().copied());
        for id in moved {
            affected.extend(evaluate(tree, id));
        }
    }
    affected
}

/// Resolves `node_id`'s own dependency edges and promotes its BLOCKED
/// commands to READY, or cancels its subtree, accordingly. Returns every
/// node id whose status changed as a result (empty if the edges are still
/// pending, or there was nothing left to promote).
fn try_promote(tree: &mut DispatchTree, node_id: Id) -> Vec<Id> {
    let Some(node) = tree.node(node_id) else {
        return Vec::new();
    };
    let Some(task_node) = node.as_task_node() else {
        return Vec::new();
    };
    let task_id = task_node.task_id;
    let edges = node.common().dependencies.clone();

    match resolve_edges(tree, &edges) {
        EdgeResolution::AllSatisfied => {
            let command_ids: Vec<Id> = tree
                .commands_of(task_id)
                .iter()
                .filter(|c| c.status == CommandStatus::Blocked)
                .map(|c| c.id)
                .collect();
            if command_ids.is_empty() {
                return Vec::new();
            }
            for cmd_id in command_ids {
                if let Some(cmd) = tree.command_mut(cmd_id) {
                    let _ = cmd.mark_ready();
                }
                tree.touch_command(cmd_id);
            }
            tree.recompute_rollup_from(node_id);
            vec![node_id]
        }
        EdgeResolution::Unsatisfiable => cancel_subtree(tree, node_id),
        EdgeResolution::Pending => Vec::new(),
    }
}

enum EdgeResolution {
    AllSatisfied,
    Unsatisfiable,
    Pending,
}

fn depends_on(edges: &[DependencyEdge], target: Id) -> bool {
    edges.iter().any(|e| e.target == target)
}

fn resolve_edges(tree: &DispatchTree, edges: &[DependencyEdge]) -> EdgeResolution {
    let mut all_satisfied = true;
    for edge in edges {
        let Some(target) = tree.node(edge.target) else {
            continue;
        };
        let status = target.common().status;
        if edge.satisfied_by(status) {
            continue;
        }
        all_satisfied = false;
        if status.is_terminal() {
            // Target reached a terminal status outside the accepted set and
            // cannot transition again on its own: this edge can never be
            // satisfied.
            return EdgeResolution::Unsatisfiable;
        }
    }
    if all_satisfied {
        EdgeResolution::AllSatisfied
    } else {
        EdgeResolution::Pending
    }
}

/// Sets `node_id` CANCELED, and if it is a folder, every descendant too.
/// Returns every node id it touched, so a caller re-priming `evaluate` from
/// each one catches dependents that target a descendant directly rather
/// than the subtree root.
fn cancel_subtree(tree: &mut DispatchTree, node_id: Id) -> Vec<Id> {
    let mut touched = Vec::new();
    let mut stack = vec![node_id];
    while let Some(id) = stack.pop() {
        let children = tree.children(id).to_vec();
        stack.extend(children);

        if let Some(node) = tree.node(id) {
            match &node.kind {
                NodeKind::Task(t) => {
                    let task_id = t.task_id;
                    let command_ids: Vec<Id> =
                        tree.commands_of(task_id).iter().map(|c| c.id).collect();
                    for cmd_id in command_ids {
                        if let Some(cmd) = tree.command_mut(cmd_id) {
                            cmd.cancel();
                        }
                        tree.touch_command(cmd_id);
                    }
                }
                NodeKind::Folder(_) => {}
            }
        }
        tree.recompute_rollup_from(id);
        touched.push(id);
    }
    touched
}

/// Depth-first cycle check over the dependency graph reachable from every
/// node. On a cycle, returns the offending chain of node names in path
/// order.
pub fn check_cycles(
    node_ids: &[Id],
    edges_of: impl Fn(Id) -> Vec<Id>,
    name_of: impl Fn(Id) -> String,
) -> Result<()> {
    let mut visited: HashSet<Id> = HashSet::new();
    let mut on_path: HashMap<Id, usize> = HashMap::new();
    let mut path: Vec<Id> = Vec::new();

    fn visit(
        node: Id,
        edges_of: &impl Fn(Id) -> Vec<Id>,
        name_of: &impl Fn(Id) -> String,
        visited: &mut HashSet<Id>,
        on_path: &mut HashMap<Id, usize>,
        path: &mut Vec<Id>,
    ) -> Result<()> {
        if let Some(&idx) = on_path.get(&node) {
            let mut chain: Vec<String> = path[idx..].iter().map(|id| name_of(*id)).collect();
            chain.push(name_of(node));
            return Err(DispatchError::DependencyCycle(chain.join(" -> ")));
        }
        if visited.contains(&node) {
            return Ok(());
        }
        on_path.insert(node, path.len());
        path.push(node);
        for next in edges_of(node) {
            visit(next, edges_of, name_of, visited, on_path, path)?;
        }
        path.pop();
        on_path.remove(&node);
        visited.insert(node);
        Ok(())
    }

    for &id in node_ids {
        if !visited.contains(&id) {
            visit(id, &edges_of, &name_of, &mut visited, &mut on_path, &mut path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Command, Node, NodeCommon, Task, TaskNode};

    fn leaf(tree: &mut DispatchTree, name: &str, parent: Id) -> (Id, Id) {
        let task_id = tree.ids_mut().next("Task");
        let task = Task::new(task_id, name, "noop");
        tree.insert_task(task);
        let node_id = tree.ids_mut().next("TaskNode");
        let node = Node {
            kind: NodeKind::Task(TaskNode {
                common: NodeCommon::new(node_id, name, "alice"),
                task_id,
            }),
        };
        tree.insert_node(node, parent).unwrap();
        let cmd_id = tree.ids_mut().next("Command");
        tree.set_commands(task_id, vec![Command::new(cmd_id, task_id, "run")]);
        (node_id, cmd_id)
    }

    #[test]
    fn promotes_to_ready_once_dependency_done() {
        let mut tree = DispatchTree::new();
        let root = tree.root();
        let (a_node, a_cmd) = leaf(&mut tree, "A", root);
        let (b_node, _b_cmd) = leaf(&mut tree, "B", root);

        tree.node_mut(b_node).unwrap().common_mut().dependencies.push(DependencyEdge {
            target: a_node,
            accepted: vec![CommandStatus::Done],
        });

        assert!(evaluate(&mut tree, a_node).is_empty());

        tree.command_mut(a_cmd).unwrap().mark_ready().unwrap();
        tree.command_mut(a_cmd).unwrap().bind(1).unwrap();
        tree.command_mut(a_cmd).unwrap().complete().unwrap();
        tree.recompute_rollup_from(a_node);

        let affected = evaluate(&mut tree, a_node);
        assert_eq!(affected, vec![b_node]);
        let b_task = tree.node(b_node).unwrap().as_task_node().unwrap().task_id;
        assert_eq!(tree.commands_of(b_task)[0].status, CommandStatus::Ready);
    }

    #[test]
    fn cancels_downstream_when_dependency_becomes_unsatisfiable() {
        let mut tree = DispatchTree::new();
        let root = tree.root();
        let (a_node, a_cmd) = leaf(&mut tree, "A", root);
        let (b_node, _b_cmd) = leaf(&mut tree, "B", root);

        tree.node_mut(b_node).unwrap().common_mut().dependencies.push(DependencyEdge {
            target: a_node,
            accepted: vec![CommandStatus::Done],
        });

        tree.command_mut(a_cmd).unwrap().mark_ready().unwrap();
        tree.command_mut(a_cmd).unwrap().bind(1).unwrap();
        tree.command_mut(a_cmd).unwrap().fail("boom", 1).unwrap();
        tree.recompute_rollup_from(a_node);

        let affected = evaluate(&mut tree, a_node);
        assert_eq!(affected, vec![b_node]);
        let b_task = tree.node(b_node).unwrap().as_task_node().unwrap().task_id;
        assert_eq!(tree.commands_of(b_task)[0].status, CommandStatus::Canceled);
    }

    #[test]
    fn promote_ready_marks_a_zero_dependency_leaf_ready() {
        let mut tree = DispatchTree::new();
        let root = tree.root();
        let (node_id, cmd_id) = leaf(&mut tree, "A", root);

        let affected = promote_ready(&mut tree, vec![node_id]);

        assert_eq!(affected, vec![node_id]);
        assert_eq!(tree.command(cmd_id).unwrap().status, CommandStatus::Ready);
    }

    #[test]
    fn promote_ready_resolves_an_edge_onto_an_already_done_node() {
        let mut tree = DispatchTree::new();
        let root = tree.root();
        let (a_node, a_cmd) = leaf(&mut tree, "A", root);
        let (b_node, b_cmd) = leaf(&mut tree, "B", root);

        tree.command_mut(a_cmd).unwrap().mark_ready().unwrap();
        tree.command_mut(a_cmd).unwrap().bind(1).unwrap();
        tree.command_mut(a_cmd).unwrap().complete().unwrap();
        tree.recompute_rollup_from(a_node);

        tree.node_mut(b_node).unwrap().common_mut().dependencies.push(DependencyEdge {
            target: a_node,
            accepted: vec![CommandStatus::Done],
        });

        let affected = promote_ready(&mut tree, vec![b_node]);

        assert_eq!(affected, vec![b_node]);
        assert_eq!(tree.command(b_cmd).unwrap().status, CommandStatus::Ready);
    }

    #[test]
    fn detects_a_simple_cycle() {
        let edges: HashMap<Id, Vec<Id>> =
            HashMap::from([(1, vec![2]), (2, vec![3]), (3, vec![1])]);
        let result = check_cycles(
            &[1, 2, 3],
            |id| edges.get(&id).cloned().unwrap_or_default(),
            |id| format!("node{id}"),
        );
        assert!(matches!(result, Err(DispatchError::DependencyCycle(_))));
    }

    #[test]
    fn accepts_a_dag() {
        let edges: HashMap<Id, Vec<Id>> = HashMap::from([(1, vec![2, 3]), (2, vec![3]), (3, vec![])]);
        let result = check_cycles(&[1, 2, 3], |id| edges.get(&id).cloned().unwrap_or_default(), |id| {
            format!("node{id}")
        });
        assert!(result.is_ok());
    }
}
