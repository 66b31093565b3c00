//! Control-operation DTOs for `/nodes/:id/...` and `/licences/:token`,
//! following a `PUT`-per-field resource update shape.

use serde::Deserialize;

use crate::model::CommandStatus;

/// `PUT /nodes/:id/status`: force a status transition (cancel, pause,
/// restart) the way an operator would from a farm dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct SetNodeStatusRequest {
    pub status: CommandStatus,
}

/// `PUT /nodes/:id/dispatch-key`
#[derive(Debug, Clone, Deserialize)]
pub struct SetDispatchKeyRequest {
    pub dispatch_key: f64,
}

/// `PUT /nodes/:id/max-rn`
#[derive(Debug, Clone, Deserialize)]
pub struct SetMaxRnRequest {
    pub max_rn: i32,
}

/// `PUT /licences/:token`: declare or change a licence token's total
/// concurrent capacity.
#[derive(Debug, Clone, Deserialize)]
pub struct SetLicenceCapacityRequest {
    pub capacity: u32,
}

/// `PUT /commands/:id/report`: the worker's status callback, distinct from
/// the control operations above since it comes from the worker daemon
/// rather than an operator.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandStatusReport {
    pub completion: Option<f32>,
    pub outcome: CommandOutcome,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandOutcome {
    Progress,
    Done,
    Error,
}
