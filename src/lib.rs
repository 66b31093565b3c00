//! Dependency-aware dispatcher for a render farm: clients submit a DAG of
//! tasks, the dispatcher assigns leaf commands to worker render nodes
//! honoring dependencies, pool quotas and licence tokens, and persists state
//! so the queue survives a restart.

pub mod api;
pub mod assignment;
pub mod config;
pub mod db;
pub mod dependency;
pub mod executor;
pub mod graph_builder;
pub mod model;
pub mod submission;
pub mod tree;
pub mod version;

use thiserror::Error;

use model::CommandStatus;

/// Errors surfaced by the dispatch core. Per the error-handling design, only
/// `Validation`, `DependencyCycle` and `GraphSubmission` are meant to reach a
/// submitter synchronously; the rest are recorded on node/command state.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("dependency cycle: {0}")]
    DependencyCycle(String),

    #[error("graph submission rejected: {status} {reason}")]
    GraphSubmission { status: u16, reason: String },

    #[error("no licence token available for {0}")]
    ResourceExhausted(String),

    #[error("render node unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("command execution failed: {0}")]
    Execution(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] db::DatabaseError),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: CommandStatus,
        to: CommandStatus,
    },

    #[error("node not found: {0}")]
    NotFound(String),
}

/// Result type for dispatch core operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
