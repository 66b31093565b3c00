//! A single dependency-free task goes from submission to a DONE rollup with
//! one idle worker available, driven entirely through the public submission
//! and assignment surfaces rather than a hand-built tree.

mod common;

use octopus_dispatch::assignment::LicenceRegistry;
use octopus_dispatch::graph_builder::{BuilderTask, Graph, GraphDumper};
use octopus_dispatch::model::{CommandStatus, RenderNode};
use octopus_dispatch::submission;
use octopus_dispatch::tree::DispatchTree;

use common::{report_done, run_until_quiescent, ScriptedWorkerClient};

#[tokio::test]
async fn single_task_completes_and_rolls_up_to_done() {
    let mut graph = Graph::new("shot010", "alice", "");
    graph.add_new_task(BuilderTask::new("render", "maya_batch")).unwrap();
    let wire = GraphDumper::dump(&mut graph).unwrap();

    let mut tree = DispatchTree::new();
    let result = submission::submit(&mut tree, &wire).unwrap();
    tree.insert_render_node(RenderNode::new(1, "rn01", "10.0.0.1", 8000));

    let mut licences = LicenceRegistry::new();
    let worker = ScriptedWorkerClient::default();
    run_until_quiescent(&mut tree, &mut licences, &worker).await;

    let command_id = worker.dispatched_ids()[0];
    assert_eq!(tree.command(command_id).unwrap().status, CommandStatus::Running);
    assert_eq!(tree.compute_status(result.root_node_id), CommandStatus::Running);

    report_done(&mut tree, command_id);
    run_until_quiescent(&mut tree, &mut licences, &worker).await;

    assert_eq!(tree.command(command_id).unwrap().status, CommandStatus::Done);
    assert_eq!(tree.compute_status(result.root_node_id), CommandStatus::Done);
    assert!(tree.render_node(1).unwrap().is_idle());
}
