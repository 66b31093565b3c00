//! API data transfer objects (DTOs) and response models
//!
//! Provides request/response structures for API endpoints with validation.

pub mod control;
pub mod node;
pub mod render_node;

pub use control::{
    CommandOutcome, CommandStatusReport, SetDispatchKeyRequest, SetLicenceCapacityRequest, SetMaxRnRequest,
    SetNodeStatusRequest,
};
pub use node::{CommandResponse, NodeKindResponse, NodeResponse, SubmissionResponse};
pub use render_node::{HeartbeatRequest, RegisterRenderNodeRequest, RenderNodeResponse};

/// System health response
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    /// Overall status
    pub status: String,

    /// Database connection status
    pub database: String,

    /// API version
    pub version: String,

    /// Current timestamp
    pub timestamp: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn new(status: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            database: database.into(),
            version: crate::version::VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// System info response
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SystemInfoResponse {
    /// Application version
    pub version: String,

    /// Package name
    pub pkg_name: String,
}

/// System metrics response: a snapshot of the dispatch tree and worker pool.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SystemMetricsResponse {
    /// Total tasks in the tree
    pub total_tasks: i64,

    /// Commands currently RUNNING
    pub running_commands: i64,

    /// Commands currently READY (awaiting assignment)
    pub ready_commands: i64,

    /// Registered render nodes
    pub total_render_nodes: i64,

    /// Render nodes with no command assigned
    pub idle_render_nodes: i64,

    /// Registered licence tokens currently at capacity
    pub exhausted_licences: i64,
}

/// Server status response
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    /// Server name
    pub name: String,

    /// Server UUID
    pub uuid: String,

    /// Server version
    pub version: String,

    /// Server status
    pub status: String,

    /// Number of connected clients
    pub connected_clients: u32,

    /// Database connection status
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response() {
        let health = HealthResponse::new("ok", "connected");
        assert_eq!(health.status, "ok");
        assert_eq!(health.database, "connected");
        assert!(!health.version.is_empty());
        assert!(!health.timestamp.is_empty());
    }

    #[test]
    fn test_system_info_response() {
        let info = SystemInfoResponse { version: "1.0.0".to_string(), pkg_name: "octopus-dispatch".to_string() };
        assert_eq!(info.version, "1.0.0");
        assert_eq!(info.pkg_name, "octopus-dispatch");
    }

    #[test]
    fn test_system_metrics_response() {
        let metrics = SystemMetricsResponse {
            total_tasks: 100,
            running_commands: 10,
            ready_commands: 5,
            total_render_nodes: 20,
            idle_render_nodes: 12,
            exhausted_licences: 1,
        };
        assert_eq!(metrics.total_tasks, 100);
        assert_eq!(metrics.running_commands, 10);
    }
}
