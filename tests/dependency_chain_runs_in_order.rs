//! A→B→C chain: each task stays BLOCKED until its predecessor reaches DONE,
//! and at no point are two non-adjacent tasks RUNNING out of order.

mod common;

use octopus_dispatch::assignment::LicenceRegistry;
use octopus_dispatch::graph_builder::{BuilderTask, Graph, GraphDumper};
use octopus_dispatch::model::{CommandStatus, RenderNode};
use octopus_dispatch::submission;
use octopus_dispatch::tree::DispatchTree;

use common::{report_done, run_until_quiescent, ScriptedWorkerClient};

#[tokio::test]
async fn chain_of_three_tasks_runs_each_only_after_its_predecessor_completes() {
    let mut graph = Graph::new("shot010", "alice", "");
    let a = graph.add_new_task(BuilderTask::new("a", "maya_batch")).unwrap();
    let b = graph.add_new_task(BuilderTask::new("b", "maya_batch")).unwrap();
    let c = graph.add_new_task(BuilderTask::new("c", "maya_batch")).unwrap();
    graph
        .add_chain(&[a, b, c], Some(vec![CommandStatus::Done]))
        .unwrap();
    let wire = GraphDumper::dump(&mut graph).unwrap();

    let mut tree = DispatchTree::new();
    let result = submission::submit(&mut tree, &wire).unwrap();
    tree.insert_render_node(RenderNode::new(1, "rn01", "10.0.0.1", 8000));

    let a_node = tree.children(result.root_node_id)[0];
    let b_node = tree.children(result.root_node_id)[1];
    let c_node = tree.children(result.root_node_id)[2];
    let a_task = tree.node(a_node).unwrap().as_task_node().unwrap().task_id;
    let b_task = tree.node(b_node).unwrap().as_task_node().unwrap().task_id;
    let c_task = tree.node(c_node).unwrap().as_task_node().unwrap().task_id;

    let mut licences = LicenceRegistry::new();
    let worker = ScriptedWorkerClient::default();

    // Only A is unblocked, so only A's command can ever be dispatched first.
    run_until_quiescent(&mut tree, &mut licences, &worker).await;
    assert_eq!(worker.dispatched_ids(), vec![tree.commands_of(a_task)[0].id]);
    assert_eq!(tree.commands_of(b_task)[0].status, CommandStatus::Blocked);
    assert_eq!(tree.commands_of(c_task)[0].status, CommandStatus::Blocked);

    let a_command_id = tree.commands_of(a_task)[0].id;
    report_done(&mut tree, a_command_id);
    run_until_quiescent(&mut tree, &mut licences, &worker).await;
    assert_eq!(worker.dispatched_ids().len(), 2);
    assert_eq!(tree.commands_of(b_task)[0].status, CommandStatus::Running);
    assert_eq!(tree.commands_of(c_task)[0].status, CommandStatus::Blocked);

    let b_command_id = tree.commands_of(b_task)[0].id;
    report_done(&mut tree, b_command_id);
    run_until_quiescent(&mut tree, &mut licences, &worker).await;
    assert_eq!(worker.dispatched_ids().len(), 3);
    assert_eq!(tree.commands_of(c_task)[0].status, CommandStatus::Running);

    let c_command_id = tree.commands_of(c_task)[0].id;
    report_done(&mut tree, c_command_id);
    run_until_quiescent(&mut tree, &mut licences, &worker).await;

    assert_eq!(tree.compute_status(result.root_node_id), CommandStatus::Done);
}
