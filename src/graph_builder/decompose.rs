//! The default decomposer: one command per task, or a frame-range sequence
//! when the task's arguments carry integer `start`/`end` keys. See
//! DESIGN.md for the packet-size rounding rule this follows.

use std::collections::HashMap;

use crate::graph_builder::graph::{BuilderCommand, BuilderTask};
use crate::{DispatchError, Result};

const START_KEY: &str = "start";
const END_KEY: &str = "end";
const PACKET_SIZE_KEY: &str = "packetSize";

/// Runs the default decomposer against `task`, returning the commands it
/// should carry. No-op (empty result not an error) if the task already
/// carries manually-added commands.
pub fn decompose(task: &BuilderTask) -> Result<Vec<BuilderCommand>> {
    if task.decomposed {
        return Ok(task.commands.clone());
    }

    match (task.arguments.get(START_KEY), task.arguments.get(END_KEY)) {
        (Some(start), Some(end)) => {
            let start: i64 = start
                .parse()
                .map_err(|_| DispatchError::Validation(format!("task {}: start is not an integer", task.name)))?;
            let end: i64 = end
                .parse()
                .map_err(|_| DispatchError::Validation(format!("task {}: end is not an integer", task.name)))?;
            let packet_size: i64 = match task.arguments.get(PACKET_SIZE_KEY) {
                Some(raw) => raw.parse().map_err(|_| {
                    DispatchError::Validation(format!("task {}: packetSize is not an integer", task.name))
                })?,
                None => 1,
            };
            decompose_frame_range(task, start, end, packet_size)
        }
        _ => Ok(vec![single_command(task)]),
    }
}

fn single_command(task: &BuilderTask) -> BuilderCommand {
    BuilderCommand {
        description: task.name.clone(),
        arguments: task.arguments.clone(),
    }
}

/// One command per `packetSize`-sized slice of `[start..=end]`; the final
/// packet is shorter when the range doesn't divide evenly. `packetSize <= 0`
/// is a validation error rather than an infinite loop.
fn decompose_frame_range(task: &BuilderTask, start: i64, end: i64, packet_size: i64) -> Result<Vec<BuilderCommand>> {
    if packet_size <= 0 {
        return Err(DispatchError::Validation(format!(
            "task {}: packetSize must be positive, got {packet_size}",
            task.name
        )));
    }
    if end < start {
        return Err(DispatchError::Validation(format!(
            "task {}: end ({end}) is before start ({start})",
            task.name
        )));
    }

    let mut commands = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let packet_end = (cursor + packet_size - 1).min(end);
        let mut arguments: HashMap<String, String> = task.arguments.clone();
        arguments.insert(START_KEY.to_string(), cursor.to_string());
        arguments.insert(END_KEY.to_string(), packet_end.to_string());
        commands.push(BuilderCommand {
            description: format!("{}_{}-{}", task.name, cursor, packet_end),
            arguments,
        });
        cursor = packet_end + 1;
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_task_with_no_frame_range_gets_one_command() {
        let task = BuilderTask::new("comp", "nuke_batch");
        let commands = decompose(&task).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].description, "comp");
    }

    #[test]
    fn frame_range_splits_into_even_packets() {
        let task = BuilderTask::new("render", "maya_batch")
            .with_argument("start", "1")
            .with_argument("end", "10")
            .with_argument("packetSize", "5");
        let commands = decompose(&task).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].arguments["start"], "1");
        assert_eq!(commands[0].arguments["end"], "5");
        assert_eq!(commands[1].arguments["start"], "6");
        assert_eq!(commands[1].arguments["end"], "10");
    }

    #[test]
    fn frame_range_final_packet_is_shorter() {
        let task = BuilderTask::new("render", "maya_batch")
            .with_argument("start", "1")
            .with_argument("end", "7")
            .with_argument("packetSize", "3");
        let commands = decompose(&task).unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[2].arguments["start"], "7");
        assert_eq!(commands[2].arguments["end"], "7");
    }

    #[test]
    fn packet_size_must_be_positive() {
        let task = BuilderTask::new("render", "maya_batch")
            .with_argument("start", "1")
            .with_argument("end", "10")
            .with_argument("packetSize", "0");
        assert!(decompose(&task).is_err());
    }

    #[test]
    fn manually_added_commands_are_left_alone() {
        let task = BuilderTask::new("comp", "nuke_batch")
            .add_command("custom", HashMap::new());
        let commands = decompose(&task).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].description, "custom");
    }
}
