//! `Command`: the atomic scheduling unit, and its lifecycle transitions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::status::CommandStatus;
use super::Id;
use crate::{DispatchError, Result};

/// The atomic scheduling unit: one process invocation on one render node.
#[derive(Debug, Clone)]
pub struct Command {
    pub id: Id,
    pub description: String,
    pub task_id: Id,
    pub status: CommandStatus,
    /// Progress in `0.0..=1.0`, monotone non-decreasing within an attempt.
    pub completion: f32,
    pub assigned_render_node: Option<Id>,
    pub start_time: Option<DateTime<Utc>>,
    pub update_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub attempt: u32,
    /// Overlay over the owning task's arguments.
    pub arguments: HashMap<String, String>,
}

impl Command {
    pub fn new(id: Id, task_id: Id, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            task_id,
            status: CommandStatus::Blocked,
            completion: 0.0,
            assigned_render_node: None,
            start_time: None,
            update_time: Utc::now(),
            end_time: None,
            message: None,
            attempt: 0,
            arguments: HashMap::new(),
        }
    }

    /// BLOCKED→READY: all dependency edges on the owning node are satisfied.
    /// Invariant: only valid from BLOCKED.
    pub fn mark_ready(&mut self) -> Result<()> {
        if self.status != CommandStatus::Blocked {
            return Err(DispatchError::InvalidTransition {
                from: self.status,
                to: CommandStatus::Ready,
            });
        }
        self.status = CommandStatus::Ready;
        self.update_time = Utc::now();
        Ok(())
    }

    /// READY→RUNNING: bound to `render_node` by the assignment loop.
    pub fn bind(&mut self, render_node: Id) -> Result<()> {
        if self.status != CommandStatus::Ready {
            return Err(DispatchError::InvalidTransition {
                from: self.status,
                to: CommandStatus::Running,
            });
        }
        self.status = CommandStatus::Running;
        self.assigned_render_node = Some(render_node);
        let now = Utc::now();
        if self.start_time.is_none() {
            self.start_time = Some(now);
        }
        self.update_time = now;
        Ok(())
    }

    /// RUNNING→DONE: reported by the worker.
    pub fn complete(&mut self) -> Result<()> {
        if self.status != CommandStatus::Running {
            return Err(DispatchError::InvalidTransition {
                from: self.status,
                to: CommandStatus::Done,
            });
        }
        self.status = CommandStatus::Done;
        self.completion = 1.0;
        self.assigned_render_node = None;
        let now = Utc::now();
        self.update_time = now;
        self.end_time = Some(now);
        Ok(())
    }

    /// RUNNING→ERROR, then auto-retry to READY if `attempt < max_attempt`;
    /// otherwise terminal. Returns whether the command was requeued.
    pub fn fail(&mut self, message: impl Into<String>, max_attempt: u32) -> Result<bool> {
        if self.status != CommandStatus::Running {
            return Err(DispatchError::InvalidTransition {
                from: self.status,
                to: CommandStatus::Error,
            });
        }
        self.attempt += 1;
        self.message = Some(message.into());
        self.assigned_render_node = None;
        self.update_time = Utc::now();
        if self.attempt < max_attempt {
            self.status = CommandStatus::Ready;
            self.completion = 0.0;
            Ok(true)
        } else {
            self.status = CommandStatus::Error;
            self.end_time = Some(self.update_time);
            Ok(false)
        }
    }

    /// RUNNING→READY with `attempt` unchanged: the dispatch RPC itself
    /// failed before the worker ever started the command, as opposed to
    /// [`Command::fail`] where the worker ran and reported failure.
    pub fn revert_unbound(&mut self) -> Result<()> {
        if self.status != CommandStatus::Running {
            return Err(DispatchError::InvalidTransition {
                from: self.status,
                to: CommandStatus::Ready,
            });
        }
        self.status = CommandStatus::Ready;
        self.assigned_render_node = None;
        self.start_time = None;
        self.update_time = Utc::now();
        Ok(())
    }

    /// Worker heartbeat miss: RUNNING reverts to READY with attempt
    /// incremented, subject to `max_attempt` exactly like an explicit
    /// failure report.
    pub fn revert_for_lost_worker(&mut self, max_attempt: u32) -> Result<bool> {
        self.fail("render node heartbeat lost", max_attempt)
    }

    /// Any→CANCELED, user-initiated and idempotent.
    pub fn cancel(&mut self) {
        if self.status == CommandStatus::Canceled {
            return;
        }
        self.status = CommandStatus::Canceled;
        self.assigned_render_node = None;
        let now = Utc::now();
        self.update_time = now;
        self.end_time = Some(now);
    }

    /// Any non-terminal→PAUSED, user-initiated and idempotent.
    pub fn pause(&mut self) {
        if self.status.is_terminal() || self.status == CommandStatus::Paused {
            return;
        }
        self.status = CommandStatus::Paused;
        self.update_time = Utc::now();
    }

    /// Explicit restart, the only way past a terminal ERROR/CANCELED: resets
    /// attempt and completion, returns to READY.
    pub fn restart(&mut self) {
        self.status = CommandStatus::Ready;
        self.attempt = 0;
        self.completion = 0.0;
        self.message = None;
        self.end_time = None;
        self.update_time = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_command() -> Command {
        let mut cmd = Command::new(1, 1, "echo hello");
        cmd.mark_ready().unwrap();
        cmd
    }

    #[test]
    fn happy_path_blocked_ready_running_done() {
        let mut cmd = ready_command();
        cmd.bind(7).unwrap();
        assert_eq!(cmd.status, CommandStatus::Running);
        assert_eq!(cmd.assigned_render_node, Some(7));
        cmd.complete().unwrap();
        assert_eq!(cmd.status, CommandStatus::Done);
        assert_eq!(cmd.completion, 1.0);
        assert!(cmd.assigned_render_node.is_none());
    }

    #[test]
    fn error_retries_until_max_attempt() {
        let mut cmd = ready_command();
        cmd.bind(1).unwrap();
        let requeued = cmd.fail("boom", 3).unwrap();
        assert!(requeued);
        assert_eq!(cmd.status, CommandStatus::Ready);
        assert_eq!(cmd.attempt, 1);

        cmd.bind(2).unwrap();
        let requeued = cmd.fail("boom again", 3).unwrap();
        assert!(requeued);
        assert_eq!(cmd.attempt, 2);

        cmd.bind(3).unwrap();
        let requeued = cmd.fail("boom final", 3).unwrap();
        assert!(!requeued);
        assert_eq!(cmd.status, CommandStatus::Error);
        assert_eq!(cmd.attempt, 3);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut cmd = ready_command();
        cmd.cancel();
        let end_time = cmd.end_time;
        cmd.cancel();
        assert_eq!(cmd.end_time, end_time);
        assert_eq!(cmd.status, CommandStatus::Canceled);
    }

    #[test]
    fn cannot_bind_a_command_that_is_not_ready() {
        let mut cmd = Command::new(1, 1, "echo hello");
        assert!(cmd.bind(1).is_err());
    }

    #[test]
    fn revert_unbound_does_not_increment_attempt() {
        let mut cmd = ready_command();
        cmd.bind(1).unwrap();
        cmd.revert_unbound().unwrap();
        assert_eq!(cmd.status, CommandStatus::Ready);
        assert_eq!(cmd.attempt, 0);
        assert!(cmd.assigned_render_node.is_none());
    }

    #[test]
    fn restart_resets_terminal_state() {
        let mut cmd = ready_command();
        cmd.bind(1).unwrap();
        cmd.fail("dead", 1).unwrap();
        assert_eq!(cmd.status, CommandStatus::Error);
        cmd.restart();
        assert_eq!(cmd.status, CommandStatus::Ready);
        assert_eq!(cmd.attempt, 0);
    }
}
