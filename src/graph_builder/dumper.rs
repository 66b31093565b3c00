//! Turns an assembled [`Graph`] into the wire submission document: runs
//! decomposition, the shared cycle check, hierarchical dependency lowering,
//! and serialization.

use crate::graph_builder::decompose;
use crate::graph_builder::graph::{Graph, GraphNode};
use crate::graph_builder::wire::{CommandWire, NodeKindWire, NodeWire, SubmissionWire};
use crate::model::Id;
use crate::Result;

pub struct GraphDumper;

impl GraphDumper {
    /// Runs the full submission-preparation pipeline: decompose every task,
    /// check for cycles, lower hierarchical dependencies onto leaves, then
    /// serialize to the wire shape.
    pub fn dump(graph: &mut Graph) -> Result<SubmissionWire> {
        Self::decompose_all(graph)?;
        Self::check_cycles(graph)?;
        Self::lower_hierarchical_dependencies(graph);
        Ok(Self::serialize(graph))
    }

    fn decompose_all(graph: &mut Graph) -> Result<()> {
        for node in &mut graph.nodes {
            if let GraphNode::Task(task) = node {
                if !task.decomposed {
                    task.commands = decompose::decompose(task)?;
                    task.decomposed = true;
                }
            }
        }
        Ok(())
    }

    fn check_cycles(graph: &Graph) -> Result<()> {
        let ids: Vec<Id> = (0..graph.nodes.len() as Id).collect();
        crate::dependency::check_cycles(
            &ids,
            |id| {
                graph.nodes[id as usize]
                    .dependencies()
                    .iter()
                    .map(|(target, _)| *target as Id)
                    .collect()
            },
            |id| graph.nodes[id as usize].name().to_string(),
        )
    }

    /// For every TaskGroup with outgoing dependencies, copies each one down
    /// onto every descendant leaf Task, deduplicated by `(target, statuses)`.
    fn lower_hierarchical_dependencies(graph: &mut Graph) {
        let group_dependencies: Vec<(usize, Vec<(usize, Vec<crate::model::CommandStatus>)>)> = graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| match node {
                GraphNode::TaskGroup(g) if !g.dependencies.is_empty() => Some((idx, g.dependencies.clone())),
                _ => None,
            })
            .collect();

        for (group_idx, dependencies) in group_dependencies {
            let leaves = Self::leaf_tasks_under(graph, group_idx);
            for leaf in leaves {
                for dep in &dependencies {
                    let existing = graph.nodes[leaf].dependencies_mut();
                    if !existing.contains(dep) {
                        existing.push(dep.clone());
                    }
                }
            }
        }
    }

    fn leaf_tasks_under(graph: &Graph, node_idx: usize) -> Vec<usize> {
        match &graph.nodes[node_idx] {
            GraphNode::Task(_) => vec![node_idx],
            GraphNode::TaskGroup(g) => g
                .children
                .clone()
                .into_iter()
                .flat_map(|child| Self::leaf_tasks_under(graph, child))
                .collect(),
        }
    }

    fn serialize(graph: &Graph) -> SubmissionWire {
        let tasks = graph.nodes.iter().map(Self::serialize_node).collect();
        SubmissionWire {
            name: graph.name.clone(),
            meta: graph.meta.clone(),
            user: graph.user.clone(),
            pool_name: graph.pool_name.clone(),
            max_rn: graph.max_rn,
            root: graph.root,
            tasks,
        }
    }

    fn serialize_node(node: &GraphNode) -> NodeWire {
        let dependencies = node
            .dependencies()
            .iter()
            .map(|(target, statuses)| (*target, statuses.iter().map(|s| s.as_u8()).collect()))
            .collect();

        match node {
            GraphNode::Task(t) => NodeWire {
                kind: NodeKindWire::Task,
                name: t.name.clone(),
                rule: t.rule.clone(),
                arguments: t.arguments.clone(),
                environment: t.environment.clone(),
                requirements: t.requirements.clone(),
                tags: t.tags.clone(),
                dependencies,
                max_rn: t.max_rn,
                priority: t.priority,
                dispatch_key: t.dispatch_key,
                runner: Some(t.runner.clone()),
                validation_expression: t.validation_expression.clone(),
                min_nb_cores: Some(t.min_nb_cores),
                max_nb_cores: Some(t.max_nb_cores),
                ram_use: Some(t.ram_use),
                licence: t.licence.clone(),
                timer: t.timer,
                max_attempt: Some(t.max_attempt),
                commands: Some(
                    t.commands
                        .iter()
                        .map(|c| CommandWire {
                            description: c.description.clone(),
                            arguments: c.arguments.clone(),
                        })
                        .collect(),
                ),
                strategy: None,
                children: None,
            },
            GraphNode::TaskGroup(g) => NodeWire {
                kind: NodeKindWire::TaskGroup,
                name: g.name.clone(),
                rule: g.rule.clone(),
                arguments: g.arguments.clone(),
                environment: g.environment.clone(),
                requirements: g.requirements.clone(),
                tags: g.tags.clone(),
                dependencies,
                max_rn: g.max_rn,
                priority: g.priority,
                dispatch_key: g.dispatch_key,
                runner: None,
                validation_expression: None,
                min_nb_cores: None,
                max_nb_cores: None,
                ram_use: None,
                licence: None,
                timer: None,
                max_attempt: None,
                commands: None,
                strategy: Some(format!("{:?}", g.strategy)),
                children: Some(g.children.clone()),
            },
        }
    }
}
