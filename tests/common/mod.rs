//! Shared scaffolding for the scenario tests: a scriptable worker client and
//! a small driver loop that runs ticks until nothing moves, standing in for
//! the real HTTP round trip between the dispatcher and a worker daemon.

use std::sync::Mutex;

use async_trait::async_trait;

use octopus_dispatch::assignment::{AssignmentTick, LicenceRegistry};
use octopus_dispatch::executor::{DispatchRequest, WorkerClient};
use octopus_dispatch::model::{CommandStatus, Id};
use octopus_dispatch::tree::DispatchTree;
use octopus_dispatch::Result;

/// A worker client whose dispatch outcome per command is driven entirely by
/// the test: each call consults `scripted_failures` (dispatch RPC itself
/// failing, as opposed to the command failing once running) and records
/// every command it was actually asked to run.
#[derive(Default)]
pub struct ScriptedWorkerClient {
    pub dispatched: Mutex<Vec<Id>>,
    pub killed: Mutex<Vec<Id>>,
    pub fail_dispatch_for: Mutex<Vec<Id>>,
}

impl ScriptedWorkerClient {
    pub fn fail_dispatch_once(&self, command_id: Id) {
        self.fail_dispatch_for.lock().unwrap().push(command_id);
    }

    pub fn dispatched_ids(&self) -> Vec<Id> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerClient for ScriptedWorkerClient {
    async fn dispatch(&self, _host: &str, _port: u16, request: DispatchRequest) -> Result<()> {
        let mut scripted = self.fail_dispatch_for.lock().unwrap();
        if let Some(pos) = scripted.iter().position(|id| *id == request.command_id) {
            scripted.remove(pos);
            return Err(octopus_dispatch::DispatchError::WorkerUnavailable("scripted failure".into()));
        }
        drop(scripted);
        self.dispatched.lock().unwrap().push(request.command_id);
        Ok(())
    }

    async fn kill(&self, _host: &str, _port: u16, command_id: Id) -> Result<()> {
        self.killed.lock().unwrap().push(command_id);
        Ok(())
    }
}

/// Runs ticks until a pass neither binds nor unbinds anything, up to a
/// generous bound so a stuck graph fails the test instead of hanging it.
pub async fn run_until_quiescent(
    tree: &mut DispatchTree,
    licences: &mut LicenceRegistry,
    worker: &ScriptedWorkerClient,
) {
    let tick = AssignmentTick::new(chrono::Duration::seconds(60));
    for _ in 0..50 {
        let outcome = tick.run(tree, licences, worker).await;
        if outcome.bound.is_empty() && outcome.dispatch_failed.is_empty() && outcome.reaped.is_empty() {
            return;
        }
    }
    panic!("assignment loop did not settle within the tick budget");
}

/// Applies a worker's status report for `command_id` the way
/// `api::handlers::nodes::report_command_status` does: mutate the command,
/// touch it, recompute the owning node's rollup, then re-run the dependency
/// engine from that node so downstream BLOCKED nodes see the change.
pub fn report_done(tree: &mut DispatchTree, command_id: Id) {
    report(tree, command_id, CommandStatus::Done, None, 1);
}

pub fn report_error(tree: &mut DispatchTree, command_id: Id, max_attempt: u32) {
    report(tree, command_id, CommandStatus::Error, Some("scripted failure".into()), max_attempt);
}

fn report(tree: &mut DispatchTree, command_id: Id, outcome: CommandStatus, message: Option<String>, max_attempt: u32) {
    let task_id = tree.command(command_id).expect("command exists").task_id;
    {
        let cmd = tree.command_mut(command_id).expect("command exists");
        match outcome {
            CommandStatus::Done => cmd.complete().unwrap(),
            CommandStatus::Error => {
                cmd.fail(message.unwrap_or_default(), max_attempt).unwrap();
            }
            other => panic!("report helper only handles Done/Error, got {other:?}"),
        }
    }
    tree.touch_command(command_id);
    if let Some(task_node_id) = tree.task_node_for(task_id) {
        tree.recompute_rollup_from(task_node_id);
        octopus_dispatch::dependency::evaluate(tree, task_node_id);
    }
}
