//! The assignment loop: one pass of matching READY commands to idle render
//! nodes, applying pool quotas, licence limits, and strategy ordering, then
//! dispatching over the worker RPC.

use std::collections::HashSet;

use crate::assignment::licence::LicenceRegistry;
use crate::assignment::strategy::{order_candidates, Candidate};
use crate::executor::{DispatchRequest, WorkerClient};
use crate::model::{CommandStatus, Id, NodeKind};
use crate::tree::DispatchTree;

/// What one [`AssignmentTick::run`] pass did, for logging and tests.
#[derive(Debug, Default)]
pub struct AssignmentOutcome {
    pub bound: Vec<(Id, Id)>,
    /// Commands that matched a worker but whose dispatch RPC failed;
    /// reverted to READY, attempt unchanged.
    pub dispatch_failed: Vec<Id>,
    /// Ready commands that found no eligible worker this pass, retried
    /// silently next tick.
    pub unmatched: Vec<Id>,
    /// RUNNING commands reaped this pass for a lost worker or an expired
    /// per-command timeout, subject to the owning task's `maxAttempt`.
    pub reaped: Vec<Id>,
}

/// One assignment pass over a [`DispatchTree`]. Stateless between ticks
/// except for the heartbeat timeout configuration.
pub struct AssignmentTick {
    pub render_node_timeout: chrono::Duration,
}

impl AssignmentTick {
    pub fn new(render_node_timeout: chrono::Duration) -> Self {
        Self { render_node_timeout }
    }

    pub async fn run<W: WorkerClient>(
        &self,
        tree: &mut DispatchTree,
        licences: &mut LicenceRegistry,
        worker_client: &W,
    ) -> AssignmentOutcome {
        let mut outcome = AssignmentOutcome::default();
        outcome.reaped = self.reap_stale_running(tree, worker_client).await;
        let mut consumed_render_nodes: HashSet<Id> = HashSet::new();

        for candidate in self.ready_candidates(tree) {
            let Some(task_node_id) = tree.task_node_for(candidate.task_id) else {
                continue;
            };
            let subtree_root = self.pool_bound_ancestor(tree, task_node_id);

            let matched = self.pick_worker(tree, &candidate, subtree_root, &consumed_render_nodes);
            let Some(render_node_id) = matched else {
                outcome.unmatched.push(candidate.command_id);
                continue;
            };

            if let Some(licence) = candidate.licence.as_deref() {
                if !licences.try_reserve(licence) {
                    outcome.unmatched.push(candidate.command_id);
                    continue;
                }
            }

            consumed_render_nodes.insert(render_node_id);
            let Some(rn) = tree.render_node(render_node_id) else {
                continue;
            };
            let (host, port) = (rn.host.clone(), rn.port);

            let Some(cmd) = tree.command_mut(candidate.command_id) else {
                continue;
            };
            if cmd.bind(render_node_id).is_err() {
                if let Some(licence) = candidate.licence.as_deref() {
                    licences.release(licence);
                }
                continue;
            }
            if let Some(rn) = tree.render_node_mut(render_node_id) {
                rn.assigned_command = Some(candidate.command_id);
            }
            tree.touch_command(candidate.command_id);
            tree.recompute_rollup_from(task_node_id);
            crate::dependency::evaluate(tree, task_node_id);

            let request = DispatchRequest {
                command_id: candidate.command_id,
                runner: candidate.runner.clone(),
                arguments: candidate.arguments.clone(),
                environment: candidate.environment.clone(),
                validation_expression: candidate.validation_expression.clone(),
                timeout_seconds: candidate.timer.map(|t| t.ceil() as u64),
            };

            match worker_client.dispatch(&host, port, request).await {
                Ok(()) => {
                    outcome.bound.push((candidate.command_id, render_node_id));
                }
                Err(_) => {
                    if let Some(licence) = candidate.licence.as_deref() {
                        licences.release(licence);
                    }
                    if let Some(rn) = tree.render_node_mut(render_node_id) {
                        rn.assigned_command = None;
                    }
                    if let Some(cmd) = tree.command_mut(candidate.command_id) {
                        let _ = cmd.revert_unbound();
                    }
                    consumed_render_nodes.remove(&render_node_id);
                    tree.touch_command(candidate.command_id);
                    tree.recompute_rollup_from(task_node_id);
                    crate::dependency::evaluate(tree, task_node_id);
                    outcome.dispatch_failed.push(candidate.command_id);
                }
            }
        }

        outcome
    }

    /// Reverts or fails every RUNNING command whose worker can no longer be
    /// trusted to finish it: a heartbeat miss past `render_node_timeout`
    /// reverts to READY with attempt incremented (subject to `maxAttempt`,
    /// same as a worker-reported failure); the task's own `timer` expiring
    /// kills the worker's copy and forces the same retry/terminal decision.
    /// Commands reaped here are picked up by this same tick's normal
    /// assignment pass below, since they may already be READY again.
    async fn reap_stale_running<W: WorkerClient>(&self, tree: &mut DispatchTree, worker_client: &W) -> Vec<Id> {
        let mut reaped = Vec::new();

        for command_id in tree.commands_with_status(CommandStatus::Running) {
            let Some(cmd) = tree.command(command_id) else { continue };
            let task_id = cmd.task_id;
            let render_node_id = cmd.assigned_render_node;
            let start_time = cmd.start_time;

            let host_port = render_node_id
                .and_then(|id| tree.render_node(id))
                .map(|rn| (rn.host.clone(), rn.port));
            let worker_lost = match render_node_id.and_then(|id| tree.render_node(id)) {
                Some(rn) => !rn.is_reachable(self.render_node_timeout),
                None => true,
            };
            let timer = tree.task(task_id).and_then(|t| t.timer);
            let timed_out = !worker_lost
                && start_time
                    .zip(timer)
                    .map(|(started, seconds)| {
                        let elapsed = chrono::Utc::now().signed_duration_since(started);
                        elapsed > chrono::Duration::milliseconds((seconds * 1000.0) as i64)
                    })
                    .unwrap_or(false);

            if !worker_lost && !timed_out {
                continue;
            }

            if timed_out {
                if let Some((host, port)) = &host_port {
                    let _ = worker_client.kill(host, *port, command_id).await;
                }
            }
            if let Some(rn_id) = render_node_id {
                if let Some(rn) = tree.render_node_mut(rn_id) {
                    rn.assigned_command = None;
                }
            }

            let max_attempt = tree.task(task_id).map(|t| t.max_attempt).unwrap_or(1);
            if let Some(cmd) = tree.command_mut(command_id) {
                let result = if worker_lost {
                    cmd.revert_for_lost_worker(max_attempt)
                } else {
                    cmd.fail("command exceeded its configured timeout", max_attempt)
                };
                if result.is_err() {
                    continue;
                }
            }
            tree.touch_command(command_id);
            if let Some(task_node_id) = tree.task_node_for(task_id) {
                tree.recompute_rollup_from(task_node_id);
                crate::dependency::evaluate(tree, task_node_id);
            }
            reaped.push(command_id);
        }

        reaped
    }

    /// Collects every READY command alongside the scheduling fields needed
    /// to order and dispatch it, grouped by parent folder strategy and
    /// flattened breadth-first so nearer-root folders are served first.
    fn ready_candidates(&self, tree: &DispatchTree) -> Vec<ReadyCommand> {
        let mut by_parent: std::collections::HashMap<Id, Vec<Candidate>> =
            std::collections::HashMap::new();
        let mut details: std::collections::HashMap<Id, ReadyCommand> =
            std::collections::HashMap::new();

        for node in tree.nodes() {
            let NodeKind::Task(task_node) = &node.kind else {
                continue;
            };
            let Some(task) = tree.task(task_node.task_id) else {
                continue;
            };
            for cmd in tree.commands_of(task_node.task_id) {
                if cmd.status != CommandStatus::Ready {
                    continue;
                }
                let parent = node.common().parent.unwrap_or(tree.root());
                by_parent.entry(parent).or_default().push(Candidate {
                    node_id: task_node.common.id,
                    dispatch_key: node.common().dispatch_key,
                    creation_order: task_node.common.id,
                });
                let mut arguments = tree.flattened_arguments(task_node.common.id);
                arguments.extend(cmd.arguments.clone());
                let environment = tree.flattened_environment(task_node.common.id);
                details.insert(
                    task_node.common.id,
                    ReadyCommand {
                        command_id: cmd.id,
                        task_id: task.id,
                        runner: task.runner.clone(),
                        arguments,
                        environment,
                        validation_expression: task.validation_expression.clone(),
                        requirements: task.requirements.clone(),
                        licence: task.licence.clone(),
                        timer: task.timer,
                    },
                );
            }
        }

        let mut ordered = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(tree.root());
        let mut visited = HashSet::new();
        while let Some(folder_id) = queue.pop_front() {
            if !visited.insert(folder_id) {
                continue;
            }
            if let Some(candidates) = by_parent.remove(&folder_id) {
                let strategy = tree
                    .node(folder_id)
                    .and_then(|n| n.as_folder())
                    .map(|f| f.strategy)
                    .unwrap_or(crate::model::Strategy::Fifo);
                for candidate in order_candidates(strategy, candidates) {
                    if let Some(detail) = details.remove(&candidate.node_id) {
                        ordered.push(detail);
                    }
                }
            }
            for child in tree.children(folder_id) {
                if tree.node(*child).map(|n| n.is_folder()).unwrap_or(false) {
                    queue.push_back(*child);
                }
            }
        }
        ordered
    }

    /// Walks up from `node_id` looking for the nearest ancestor (inclusive)
    /// that a PoolShare binds, so quota can be charged against the right
    /// subtree. `None` means the subtree is unconstrained.
    fn pool_bound_ancestor(&self, tree: &DispatchTree, node_id: Id) -> Option<Id> {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if tree.pool_shares().any(|s| s.node_id == current) {
                return Some(current);
            }
            cursor = tree.parent(current);
        }
        None
    }

    fn running_count_under(&self, tree: &DispatchTree, root: Id) -> u32 {
        let mut count = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match tree.node(id).map(|n| &n.kind) {
                Some(NodeKind::Task(t)) => {
                    if tree
                        .commands_of(t.task_id)
                        .iter()
                        .any(|c| c.status == CommandStatus::Running)
                    {
                        count += 1;
                    }
                }
                Some(NodeKind::Folder(_)) => {
                    stack.extend(tree.children(id));
                }
                None => {}
            }
        }
        count
    }

    fn pick_worker(
        &self,
        tree: &DispatchTree,
        candidate: &ReadyCommand,
        subtree_root: Option<Id>,
        consumed: &HashSet<Id>,
    ) -> Option<Id> {
        if let Some(root) = subtree_root {
            let share = tree.pool_shares().find(|s| s.node_id == root)?;
            let running = self.running_count_under(tree, root);
            if share.remaining_capacity(running) == Some(0) {
                return None;
            }
        }

        tree.render_nodes()
            .filter(|rn| {
                !rn.archived
                    && rn.is_idle()
                    && rn.is_reachable(self.render_node_timeout)
                    && !consumed.contains(&rn.id)
                    && rn.satisfies(&candidate.requirements)
            })
            .min_by_key(|rn| rn.id)
            .map(|rn| rn.id)
    }
}

struct ReadyCommand {
    command_id: Id,
    task_id: Id,
    runner: String,
    arguments: std::collections::HashMap<String, String>,
    environment: std::collections::HashMap<String, String>,
    validation_expression: Option<String>,
    requirements: std::collections::HashMap<String, String>,
    licence: Option<String>,
    timer: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::client::fakes::FakeWorkerClient;
    use crate::model::{Command, Node, NodeCommon, PoolShare, RenderNode, Task, TaskNode};

    fn tree_with_one_ready_command() -> (DispatchTree, Id) {
        let mut tree = DispatchTree::new();
        let mut task = Task::new(1, "render", "maya_batch");
        task.requirements.insert("cores".to_string(), "4".to_string());
        let task_id = tree.insert_task(task);
        let node_id = tree.ids_mut().next("TaskNode");
        let node = Node {
            kind: NodeKind::Task(TaskNode {
                common: NodeCommon::new(node_id, "frame-1", "alice"),
                task_id,
            }),
        };
        tree.insert_node(node, tree.root()).unwrap();
        let mut cmd = Command::new(1, task_id, "render frame 1");
        cmd.mark_ready().unwrap();
        tree.set_commands(task_id, vec![cmd]);

        let mut rn = RenderNode::new(1, "rn01", "10.0.0.1", 8000);
        rn.cores_number = 8;
        tree.insert_render_node(rn);

        (tree, node_id)
    }

    #[tokio::test]
    async fn binds_a_ready_command_to_a_satisfying_idle_node() {
        let (mut tree, node_id) = tree_with_one_ready_command();
        let mut licences = LicenceRegistry::new();
        let worker = FakeWorkerClient::default();
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert_eq!(outcome.bound, vec![(1, 1)]);
        assert!(outcome.unmatched.is_empty());
        assert_eq!(tree.command(1).unwrap().status, CommandStatus::Running);
        assert_eq!(tree.render_node(1).unwrap().assigned_command, Some(1));
        assert_eq!(tree.node(node_id).unwrap().common().status, CommandStatus::Running);
        assert_eq!(*worker.received.lock(), vec![1]);
    }

    #[tokio::test]
    async fn no_match_leaves_command_ready() {
        let (mut tree, _node_id) = tree_with_one_ready_command();
        // Starve it of cores.
        tree.render_node_mut(1).unwrap().cores_number = 1;
        let mut licences = LicenceRegistry::new();
        let worker = FakeWorkerClient::default();
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert!(outcome.bound.is_empty());
        assert_eq!(outcome.unmatched, vec![1]);
        assert_eq!(tree.command(1).unwrap().status, CommandStatus::Ready);
    }

    #[tokio::test]
    async fn dispatch_failure_reverts_without_incrementing_attempt() {
        let (mut tree, _node_id) = tree_with_one_ready_command();
        let mut licences = LicenceRegistry::new();
        let worker = FakeWorkerClient {
            fail: true,
            ..Default::default()
        };
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert!(outcome.bound.is_empty());
        assert_eq!(outcome.dispatch_failed, vec![1]);
        let cmd = tree.command(1).unwrap();
        assert_eq!(cmd.status, CommandStatus::Ready);
        assert_eq!(cmd.attempt, 0);
        assert!(tree.render_node(1).unwrap().is_idle());
    }

    #[tokio::test]
    async fn pool_quota_blocks_assignment_once_exhausted() {
        let (mut tree, node_id) = tree_with_one_ready_command();
        let share = PoolShare::new(1, 1, node_id, 0);
        tree.insert_pool_share(share);
        let mut licences = LicenceRegistry::new();
        let worker = FakeWorkerClient::default();
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert!(outcome.bound.is_empty());
        assert_eq!(outcome.unmatched, vec![1]);
    }

    fn tree_with_one_running_command(max_attempt: u32) -> (DispatchTree, Id) {
        let mut tree = DispatchTree::new();
        let mut task = Task::new(1, "render", "maya_batch");
        task.max_attempt = max_attempt;
        let task_id = tree.insert_task(task);
        let node_id = tree.ids_mut().next("TaskNode");
        let node = Node {
            kind: NodeKind::Task(TaskNode {
                common: NodeCommon::new(node_id, "frame-1", "alice"),
                task_id,
            }),
        };
        tree.insert_node(node, tree.root()).unwrap();
        let mut cmd = Command::new(1, task_id, "render frame 1");
        cmd.mark_ready().unwrap();
        cmd.bind(1).unwrap();
        tree.set_commands(task_id, vec![cmd]);

        let mut rn = RenderNode::new(1, "rn01", "10.0.0.1", 8000);
        rn.assigned_command = Some(1);
        tree.insert_render_node(rn);

        (tree, node_id)
    }

    #[tokio::test]
    async fn a_lost_worker_reverts_its_running_command_to_ready_with_attempt_incremented() {
        let (mut tree, node_id) = tree_with_one_running_command(3);
        tree.render_node_mut(1).unwrap().last_heartbeat = chrono::Utc::now() - chrono::Duration::seconds(120);
        let mut licences = LicenceRegistry::new();
        let worker = FakeWorkerClient::default();
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert_eq!(outcome.reaped, vec![1]);
        let cmd = tree.command(1).unwrap();
        assert_eq!(cmd.attempt, 1);
        assert!(tree.render_node(1).unwrap().is_idle());
        // Reverted straight back to READY this same tick: the normal
        // assignment pass picks it up and rebinds it if the worker is
        // eligible again, but this worker is still unreachable.
        assert_eq!(cmd.status, CommandStatus::Ready);
        assert_eq!(tree.node(node_id).unwrap().common().status, CommandStatus::Ready);
    }

    #[tokio::test]
    async fn a_lost_worker_past_max_attempt_goes_straight_to_error() {
        let (mut tree, _node_id) = tree_with_one_running_command(1);
        tree.render_node_mut(1).unwrap().last_heartbeat = chrono::Utc::now() - chrono::Duration::seconds(120);
        let mut licences = LicenceRegistry::new();
        let worker = FakeWorkerClient::default();
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert_eq!(outcome.reaped, vec![1]);
        assert_eq!(tree.command(1).unwrap().status, CommandStatus::Error);
    }

    #[tokio::test]
    async fn a_command_past_its_own_timeout_is_killed_and_failed_even_with_a_reachable_worker() {
        let (mut tree, _node_id) = tree_with_one_running_command(1);
        tree.task_mut(1).unwrap().timer = Some(0.001);
        tree.command_mut(1).unwrap().start_time = Some(chrono::Utc::now() - chrono::Duration::seconds(60));
        let mut licences = LicenceRegistry::new();
        let worker = FakeWorkerClient::default();
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert_eq!(outcome.reaped, vec![1]);
        assert_eq!(tree.command(1).unwrap().status, CommandStatus::Error);
        assert_eq!(*worker.killed.lock(), vec![1]);
        assert!(tree.render_node(1).unwrap().is_idle());
    }

    #[tokio::test]
    async fn licence_exhaustion_blocks_assignment() {
        let (mut tree, _node_id) = tree_with_one_ready_command();
        tree.task_mut(1).unwrap().licence = Some("renderman".to_string());
        let mut licences = LicenceRegistry::new();
        licences.set_capacity("renderman", 0);
        let worker = FakeWorkerClient::default();
        let tick = AssignmentTick::new(chrono::Duration::seconds(60));

        let outcome = tick.run(&mut tree, &mut licences, &worker).await;

        assert!(outcome.bound.is_empty());
        assert_eq!(outcome.unmatched, vec![1]);
    }
}
