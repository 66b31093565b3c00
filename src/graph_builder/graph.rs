//! Client-side graph assembly: `Graph`, `BuilderTask`, `BuilderTaskGroup`.
//!
//! Nodes are addressed by their position in `Graph::nodes`, a flat arena the
//! client fills in before serialization. The server allocates the real
//! per-class ids only once it decodes the submission (`crate::submission`).

use std::collections::HashMap;

use crate::api::models::SubmissionResponse;
use crate::api::ApiErrorResponse;
use crate::dependency;
use crate::graph_builder::dumper::GraphDumper;
use crate::model::{CommandStatus, Strategy};
use crate::submission;
use crate::tree::DispatchTree;
use crate::{DispatchError, Result};

#[derive(Debug, Clone)]
pub struct BuilderCommand {
    pub description: String,
    pub arguments: HashMap<String, String>,
}

/// A task awaiting decomposition into commands.
#[derive(Debug, Clone)]
pub struct BuilderTask {
    pub name: String,
    pub runner: String,
    pub arguments: HashMap<String, String>,
    pub environment: HashMap<String, String>,
    pub requirements: HashMap<String, String>,
    pub tags: HashMap<String, String>,
    pub validation_expression: Option<String>,
    pub min_nb_cores: u32,
    pub max_nb_cores: u32,
    pub ram_use: u64,
    pub licence: Option<String>,
    pub timer: Option<f64>,
    pub max_attempt: u32,
    pub max_rn: i32,
    pub priority: i32,
    pub dispatch_key: f64,
    /// `(targetIndex, acceptedStatuses)`, keyed on this node since it is the
    /// dependent side. See [`Graph::add_edges`].
    pub dependencies: Vec<(usize, Vec<CommandStatus>)>,
    /// Populated by the default decomposer or a manual `addCommand` call
    /// during submission-document preparation; empty beforehand.
    pub commands: Vec<BuilderCommand>,
    pub decomposed: bool,
    /// The name this node should be addressable by under its parent's named
    /// child slots, independent of `name`. See [`Graph::add`].
    pub rule: Option<String>,
}

impl BuilderTask {
    pub fn new(name: impl Into<String>, runner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runner: runner.into(),
            arguments: HashMap::new(),
            environment: HashMap::new(),
            requirements: HashMap::new(),
            tags: HashMap::new(),
            validation_expression: None,
            min_nb_cores: 1,
            max_nb_cores: 1,
            ram_use: 0,
            licence: None,
            timer: None,
            max_attempt: 1,
            max_rn: -1,
            priority: 0,
            dispatch_key: 0.0,
            dependencies: Vec::new(),
            commands: Vec::new(),
            decomposed: false,
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_requirement(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements.insert(key.into(), value.into());
        self
    }

    pub fn with_max_attempt(mut self, max_attempt: u32) -> Self {
        self.max_attempt = max_attempt;
        self
    }

    pub fn with_licence(mut self, licence: impl Into<String>) -> Self {
        self.licence = Some(licence.into());
        self
    }

    pub fn with_dispatch_key(mut self, dispatch_key: f64) -> Self {
        self.dispatch_key = dispatch_key;
        self
    }

    /// Manually adds a command, bypassing the default decomposer; marks the
    /// task decomposed so the default decomposer is never invoked for it.
    pub fn add_command(mut self, description: impl Into<String>, arguments: HashMap<String, String>) -> Self {
        self.commands.push(BuilderCommand {
            description: description.into(),
            arguments,
        });
        self.decomposed = true;
        self
    }
}

/// A hierarchical container awaiting expansion.
#[derive(Debug, Clone)]
pub struct BuilderTaskGroup {
    pub name: String,
    pub arguments: HashMap<String, String>,
    pub environment: HashMap<String, String>,
    pub requirements: HashMap<String, String>,
    pub tags: HashMap<String, String>,
    pub strategy: Strategy,
    pub max_rn: i32,
    pub priority: i32,
    pub dispatch_key: f64,
    pub dependencies: Vec<(usize, Vec<CommandStatus>)>,
    pub children: Vec<usize>,
    /// The name this node should be addressable by under its parent's named
    /// child slots, independent of `name`. See [`Graph::add`].
    pub rule: Option<String>,
}

impl BuilderTaskGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
            environment: HashMap::new(),
            requirements: HashMap::new(),
            tags: HashMap::new(),
            strategy: Strategy::Fifo,
            max_rn: -1,
            priority: 0,
            dispatch_key: 0.0,
            dependencies: Vec::new(),
            children: Vec::new(),
            rule: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

#[derive(Debug, Clone)]
pub enum GraphNode {
    Task(BuilderTask),
    TaskGroup(BuilderTaskGroup),
}

impl GraphNode {
    pub fn name(&self) -> &str {
        match self {
            GraphNode::Task(t) => &t.name,
            GraphNode::TaskGroup(g) => &g.name,
        }
    }

    pub fn dependencies(&self) -> &[(usize, Vec<CommandStatus>)] {
        match self {
            GraphNode::Task(t) => &t.dependencies,
            GraphNode::TaskGroup(g) => &g.dependencies,
        }
    }

    pub fn dependencies_mut(&mut self) -> &mut Vec<(usize, Vec<CommandStatus>)> {
        match self {
            GraphNode::Task(t) => &mut t.dependencies,
            GraphNode::TaskGroup(g) => &mut g.dependencies,
        }
    }

    pub fn is_task_group(&self) -> bool {
        matches!(self, GraphNode::TaskGroup(_))
    }

    pub fn rule(&self) -> Option<&str> {
        match self {
            GraphNode::Task(t) => t.rule.as_deref(),
            GraphNode::TaskGroup(g) => g.rule.as_deref(),
        }
    }
}

/// The client-side assembly surface: a flat node arena rooted at an implicit
/// top-level TaskGroup.
pub struct Graph {
    pub name: String,
    pub meta: HashMap<String, String>,
    pub user: String,
    pub pool_name: String,
    pub max_rn: i32,
    pub nodes: Vec<GraphNode>,
    pub root: usize,
}

impl Graph {
    pub fn new(name: impl Into<String>, user: impl Into<String>, pool_name: impl Into<String>) -> Self {
        let root = GraphNode::TaskGroup(BuilderTaskGroup::new("root"));
        Self {
            name: name.into(),
            meta: HashMap::new(),
            user: user.into(),
            pool_name: pool_name.into(),
            max_rn: -1,
            nodes: vec![root],
            root: 0,
        }
    }

    /// Attaches `node` under the graph root. Fails if the root is a Task
    /// (tasks cannot host children).
    pub fn add(&mut self, node: GraphNode) -> Result<usize> {
        if !self.nodes[self.root].is_task_group() {
            return Err(DispatchError::Validation(
                "graph root is a task, only taskgroups can host children".to_string(),
            ));
        }
        let index = self.nodes.len();
        self.nodes.push(node);
        if let GraphNode::TaskGroup(root) = &mut self.nodes[self.root] {
            root.children.push(index);
        }
        Ok(index)
    }

    pub fn add_new_task(&mut self, task: BuilderTask) -> Result<usize> {
        self.add(GraphNode::Task(task))
    }

    pub fn add_new_task_group(&mut self, group: BuilderTaskGroup) -> Result<usize> {
        self.add(GraphNode::TaskGroup(group))
    }

    /// Each element is `(src, dst)` or `(src, dst, statusSet)`: `dst` is made
    /// dependent on `src` reaching a status in `statusSet` (default `{DONE}`).
    pub fn add_edges(&mut self, edges: &[(usize, usize, Option<Vec<CommandStatus>>)]) -> Result<()> {
        for (i, (src, dst, status_set)) in edges.iter().enumerate() {
            if *src >= self.nodes.len() || *dst >= self.nodes.len() {
                return Err(DispatchError::Validation(format!(
                    "edge[{i}] references an out-of-range node index"
                )));
            }
            let accepted = status_set.clone().unwrap_or_else(|| vec![CommandStatus::Done]);
            if accepted.is_empty() {
                return Err(DispatchError::Validation(format!(
                    "edge[{i}] has an empty status set"
                )));
            }
            self.nodes[*dst].dependencies_mut().push((*src, accepted));
        }
        Ok(())
    }

    /// Adds edges `(n_i, n_{i+1})` for every adjacent pair in `chain`, i.e.
    /// each node depends on the one before it.
    pub fn add_chain(&mut self, chain: &[usize], status_set: Option<Vec<CommandStatus>>) -> Result<()> {
        let edges: Vec<_> = chain
            .windows(2)
            .map(|pair| (pair[0], pair[1], status_set.clone()))
            .collect();
        self.add_edges(&edges)
    }

    /// Runs `GraphDumper::dump`'s full pipeline and POSTs the resulting wire
    /// document to a running dispatcher's `/graphs/` endpoint. On any
    /// non-2xx response the server's error body (or, failing to decode
    /// that, the bare status line) is folded into a single
    /// [`DispatchError::GraphSubmission`].
    pub async fn submit(&mut self, host: &str, port: u16) -> Result<SubmissionResponse> {
        let wire = GraphDumper::dump(self)?;
        let url = format!("http://{host}:{port}/graphs");
        let client = reqwest::Client::new();
        let response = client
            .post(&url)
            .json(&wire)
            .send()
            .await
            .map_err(|e| DispatchError::WorkerUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response.json::<SubmissionResponse>().await.map_err(|e| DispatchError::GraphSubmission {
                status: status.as_u16(),
                reason: e.to_string(),
            })
        } else {
            let reason = response
                .json::<ApiErrorResponse>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| status.to_string());
            Err(DispatchError::GraphSubmission {
                status: status.as_u16(),
                reason,
            })
        }
    }

    /// Runs the graph to completion in-process, with no dispatcher and no
    /// network: every command invokes `executor` (its description and
    /// flattened arguments) as soon as its dependencies resolve it to
    /// READY, and the status it returns feeds straight back into the
    /// dependency engine. `Done` completes the command; anything else is
    /// treated as a failure and subject to the task's own retry limit, same
    /// as a worker's status report would be.
    ///
    /// A fixed point over READY -> terminal -> re-evaluate-BLOCKED: loops
    /// until a pass promotes nothing new, then returns the root's rolled-up
    /// status.
    pub fn execute<F>(&mut self, mut executor: F) -> Result<CommandStatus>
    where
        F: FnMut(&str, &HashMap<String, String>) -> CommandStatus,
    {
        let wire = GraphDumper::dump(self)?;
        let mut tree = DispatchTree::new();
        let result = submission::submit(&mut tree, &wire)?;

        loop {
            let ready_ids = tree.commands_with_status(CommandStatus::Ready);
            if ready_ids.is_empty() {
                break;
            }

            for command_id in ready_ids {
                let (task_id, description, arguments, max_attempt) = {
                    let cmd = tree.command(command_id).expect("just collected by status");
                    let max_attempt = tree.task(cmd.task_id).map(|t| t.max_attempt).unwrap_or(1);
                    (cmd.task_id, cmd.description.clone(), cmd.arguments.clone(), max_attempt)
                };
                let outcome = executor(&description, &arguments);

                {
                    let cmd = tree.command_mut(command_id).expect("just collected by status");
                    cmd.bind(0)?;
                    if outcome == CommandStatus::Done {
                        cmd.complete()?;
                    } else {
                        cmd.fail("local execution reported failure", max_attempt)?;
                    }
                }

                tree.touch_command(command_id);
                if let Some(task_node_id) = tree.task_node_for(task_id) {
                    tree.recompute_rollup_from(task_node_id);
                    dependency::evaluate(&mut tree, task_node_id);
                }
            }
        }

        Ok(tree.compute_status(result.root_node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_attaches_under_root() {
        let mut graph = Graph::new("shot010", "alice", "default");
        let idx = graph.add_new_task(BuilderTask::new("render", "maya_batch")).unwrap();
        match &graph.nodes[graph.root] {
            GraphNode::TaskGroup(root) => assert_eq!(root.children, vec![idx]),
            _ => panic!("root should be a taskgroup"),
        }
    }

    #[test]
    fn add_fails_when_root_is_a_task() {
        let mut graph = Graph::new("shot010", "alice", "default");
        graph.root = graph.nodes.len();
        graph.nodes.push(GraphNode::Task(BuilderTask::new("solo", "maya_batch")));
        assert!(graph.add_new_task(BuilderTask::new("child", "maya_batch")).is_err());
    }

    #[test]
    fn add_chain_makes_each_node_depend_on_its_predecessor() {
        let mut graph = Graph::new("shot010", "alice", "default");
        let a = graph.add_new_task(BuilderTask::new("a", "maya_batch")).unwrap();
        let b = graph.add_new_task(BuilderTask::new("b", "maya_batch")).unwrap();
        let c = graph.add_new_task(BuilderTask::new("c", "maya_batch")).unwrap();
        graph.add_chain(&[a, b, c], None).unwrap();

        match &graph.nodes[b] {
            GraphNode::Task(t) => assert_eq!(t.dependencies, vec![(a, vec![CommandStatus::Done])]),
            _ => panic!(),
        }
        match &graph.nodes[c] {
            GraphNode::Task(t) => assert_eq!(t.dependencies, vec![(b, vec![CommandStatus::Done])]),
            _ => panic!(),
        }
    }

    #[test]
    fn add_edges_rejects_out_of_range_index() {
        let mut graph = Graph::new("shot010", "alice", "default");
        let a = graph.add_new_task(BuilderTask::new("a", "maya_batch")).unwrap();
        assert!(graph.add_edges(&[(a, 99, None)]).is_err());
    }

    #[test]
    fn execute_runs_a_chain_to_completion_when_every_command_succeeds() {
        let mut graph = Graph::new("shot010", "alice", "default");
        let a = graph.add_new_task(BuilderTask::new("a", "maya_batch")).unwrap();
        let b = graph.add_new_task(BuilderTask::new("b", "maya_batch")).unwrap();
        graph.add_chain(&[a, b], None).unwrap();

        let mut ran = Vec::new();
        let status = graph
            .execute(|description, _arguments| {
                ran.push(description.to_string());
                CommandStatus::Done
            })
            .unwrap();

        assert_eq!(status, CommandStatus::Done);
        assert_eq!(ran, vec!["a", "b"]);
    }

    #[test]
    fn execute_cancels_a_node_whose_dependency_never_succeeds() {
        let mut graph = Graph::new("shot010", "alice", "default");
        let a = graph.add_new_task(BuilderTask::new("a", "maya_batch")).unwrap();
        let b = graph.add_new_task(BuilderTask::new("b", "maya_batch")).unwrap();
        graph.add_chain(&[a, b], None).unwrap();

        // b is canceled once a errors out, but the aggregate still reports
        // ERROR: the root's rollup ranks ERROR above CANCELED, same as it
        // would for any other node with mixed-terminal children.
        let status = graph
            .execute(|description, _arguments| {
                if description == "a" {
                    CommandStatus::Error
                } else {
                    panic!("b should never become ready once a is terminal and unsatisfied");
                }
            })
            .unwrap();

        assert_eq!(status, CommandStatus::Error);
    }
}
