//! Domain model for the dispatch tree: nodes, tasks, commands, render nodes
//! and pools.
//!
//! Timestamps follow the ambient convention used throughout this crate:
//! `chrono::DateTime<Utc>` in memory, ISO8601 strings once persisted.
//!
//! Entities are identified by a process-wide monotonic integer per entity
//! class, assigned on first materialization and never reused within a run.
//! Every table in the persisted schema has its own integer id space.

pub mod command;
pub mod hierarchical_dict;
pub mod node;
pub mod render_node;
pub mod status;
pub mod task;

pub use command::Command;
pub use hierarchical_dict::HierarchicalDict;
pub use node::{DependencyEdge, FolderNode, Node, NodeCommon, NodeKind, Rule, TaskNode};
pub use render_node::{Pool, PoolShare, RenderNode};
pub use status::{rollup, CommandStatus, NodeStatus};
pub use task::{Requirements, Strategy, Task, TaskGroup};

/// A per-entity-class monotonic integer id, allocated by
/// [`crate::tree::IdAllocator`].
pub type Id = i64;
