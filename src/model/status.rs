//! Status enumerations for commands and nodes.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Command`](super::Command).
///
/// Wire representation is the closed set of integers fixed by the submission
/// protocol: `BLOCKED=0, READY=1, RUNNING=2, DONE=3, ERROR=4, CANCELED=5,
/// PAUSED=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CommandStatus {
    Blocked,
    Ready,
    Running,
    Done,
    Error,
    Canceled,
    Paused,
}

impl CommandStatus {
    /// Wire ordinal, per the submission protocol's closed enumeration.
    pub fn as_u8(self) -> u8 {
        match self {
            CommandStatus::Blocked => 0,
            CommandStatus::Ready => 1,
            CommandStatus::Running => 2,
            CommandStatus::Done => 3,
            CommandStatus::Error => 4,
            CommandStatus::Canceled => 5,
            CommandStatus::Paused => 6,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => CommandStatus::Blocked,
            1 => CommandStatus::Ready,
            2 => CommandStatus::Running,
            3 => CommandStatus::Done,
            4 => CommandStatus::Error,
            5 => CommandStatus::Canceled,
            6 => CommandStatus::Paused,
            _ => return None,
        })
    }

    /// A status with no further automatic transitions (user action required).
    pub fn is_terminal(self) -> bool {
        matches!(self, CommandStatus::Done | CommandStatus::Error | CommandStatus::Canceled)
    }

    /// Rollup precedence used by [`rollup`]: higher wins.
    fn rollup_rank(self) -> u8 {
        match self {
            CommandStatus::Error => 6,
            CommandStatus::Canceled => 5,
            CommandStatus::Paused => 4,
            CommandStatus::Running => 3,
            CommandStatus::Ready => 2,
            CommandStatus::Blocked => 1,
            CommandStatus::Done => 0,
        }
    }
}

impl TryFrom<u8> for CommandStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, <CommandStatus as TryFrom<u8>>::Error> {
        CommandStatus::from_u8(value).ok_or_else(|| format!("invalid command status {value}"))
    }
}

impl From<CommandStatus> for u8 {
    fn from(value: CommandStatus) -> Self {
        value.as_u8()
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommandStatus::Blocked => "BLOCKED",
            CommandStatus::Ready => "READY",
            CommandStatus::Running => "RUNNING",
            CommandStatus::Done => "DONE",
            CommandStatus::Error => "ERROR",
            CommandStatus::Canceled => "CANCELED",
            CommandStatus::Paused => "PAUSED",
        };
        write!(f, "{s}")
    }
}

/// Derived status of a node (task or folder), rolled up from its commands or
/// children. Shares the same ordinal space as [`CommandStatus`] since a
/// TaskNode with a single command mirrors that command's status exactly.
pub type NodeStatus = CommandStatus;

/// Folds a set of child statuses into a single rollup status per
/// ERROR > CANCELED > PAUSED > RUNNING > READY > BLOCKED > DONE, with `DONE`
/// as the rollup of an empty set (nothing to roll up, nothing outstanding).
pub fn rollup<I: IntoIterator<Item = CommandStatus>>(children: I) -> CommandStatus {
    children
        .into_iter()
        .max_by_key(|s| s.rollup_rank())
        .unwrap_or(CommandStatus::Done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ordinals_match_protocol() {
        assert_eq!(CommandStatus::Blocked.as_u8(), 0);
        assert_eq!(CommandStatus::Ready.as_u8(), 1);
        assert_eq!(CommandStatus::Running.as_u8(), 2);
        assert_eq!(CommandStatus::Done.as_u8(), 3);
        assert_eq!(CommandStatus::Error.as_u8(), 4);
        assert_eq!(CommandStatus::Canceled.as_u8(), 5);
        assert_eq!(CommandStatus::Paused.as_u8(), 6);
    }

    #[test]
    fn rollup_prefers_error_over_everything() {
        let statuses = [
            CommandStatus::Done,
            CommandStatus::Running,
            CommandStatus::Error,
            CommandStatus::Ready,
        ];
        assert_eq!(rollup(statuses), CommandStatus::Error);
    }

    #[test]
    fn rollup_of_all_done_is_done() {
        let statuses = [CommandStatus::Done, CommandStatus::Done];
        assert_eq!(rollup(statuses), CommandStatus::Done);
    }

    #[test]
    fn rollup_canceled_beats_running() {
        assert_eq!(
            rollup([CommandStatus::Running, CommandStatus::Canceled]),
            CommandStatus::Canceled
        );
    }

    #[test]
    fn rollup_empty_is_done() {
        assert_eq!(rollup(std::iter::empty()), CommandStatus::Done);
    }

    #[test]
    fn invalid_ordinal_rejected() {
        assert!(CommandStatus::from_u8(7).is_none());
    }

    #[test]
    fn error_is_terminal_since_only_an_explicit_restart_moves_past_it() {
        assert!(CommandStatus::Error.is_terminal());
        assert!(CommandStatus::Done.is_terminal());
        assert!(CommandStatus::Canceled.is_terminal());
        assert!(!CommandStatus::Ready.is_terminal());
        assert!(!CommandStatus::Running.is_terminal());
        assert!(!CommandStatus::Blocked.is_terminal());
        assert!(!CommandStatus::Paused.is_terminal());
    }
}
