//! A worker that stops heartbeating for more than the configured timeout
//! loses its running command: the command reverts to READY with its attempt
//! counter incremented, a different idle worker picks it up, and the lost
//! worker becomes eligible again once its heartbeat resumes.

mod common;

use chrono::{Duration, Utc};

use octopus_dispatch::assignment::LicenceRegistry;
use octopus_dispatch::graph_builder::{BuilderTask, Graph, GraphDumper};
use octopus_dispatch::model::{CommandStatus, RenderNode};
use octopus_dispatch::submission;
use octopus_dispatch::tree::DispatchTree;

use common::{run_until_quiescent, ScriptedWorkerClient};

#[tokio::test]
async fn command_survives_a_heartbeat_timeout_on_a_different_worker() {
    let mut graph = Graph::new("shot010", "alice", "");
    graph
        .add_new_task(BuilderTask::new("render", "maya_batch").with_max_attempt(2))
        .unwrap();
    let wire = GraphDumper::dump(&mut graph).unwrap();

    let mut tree = DispatchTree::new();
    submission::submit(&mut tree, &wire).unwrap();
    tree.insert_render_node(RenderNode::new(1, "rn01", "10.0.0.1", 8000));
    tree.insert_render_node(RenderNode::new(2, "rn02", "10.0.0.2", 8000));

    let mut licences = LicenceRegistry::new();
    let worker = ScriptedWorkerClient::default();

    run_until_quiescent(&mut tree, &mut licences, &worker).await;
    let command_id = worker.dispatched_ids()[0];
    let lost_rn = tree.command(command_id).unwrap().assigned_render_node.unwrap();

    tree.render_node_mut(lost_rn).unwrap().last_heartbeat = Utc::now() - Duration::seconds(120);
    assert!(!tree.render_node(lost_rn).unwrap().is_reachable(Duration::seconds(60)));

    run_until_quiescent(&mut tree, &mut licences, &worker).await;

    assert_eq!(tree.command(command_id).unwrap().attempt, 1);
    assert_eq!(tree.command(command_id).unwrap().status, CommandStatus::Running);
    let new_rn = tree.command(command_id).unwrap().assigned_render_node.unwrap();
    assert_ne!(new_rn, lost_rn);
    assert!(tree.render_node(lost_rn).unwrap().is_idle());

    tree.render_node_mut(lost_rn).unwrap().last_heartbeat = Utc::now();
    assert!(tree.render_node(lost_rn).unwrap().is_reachable(Duration::seconds(60)));
    assert!(tree.render_node(lost_rn).unwrap().is_idle());
}
