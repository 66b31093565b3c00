//! Request/response DTOs for render node registration and heartbeats.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Id, RenderNode};

/// Body of a worker's initial registration call.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRenderNodeRequest {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default = "default_cores")]
    pub cores_number: u32,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub ram_size: u64,
    #[serde(default)]
    pub characteristics: HashMap<String, String>,
}

fn default_cores() -> u32 {
    1
}

fn default_speed() -> f64 {
    1.0
}

impl RegisterRenderNodeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self.host.trim().is_empty() {
            return Err("host cannot be empty".to_string());
        }
        if self.cores_number == 0 {
            return Err("cores_number must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Body of a worker's periodic heartbeat, carrying the command it's
/// currently running (if any) so the dispatcher can reconcile drift.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatRequest {
    #[serde(default)]
    pub assigned_command: Option<Id>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderNodeResponse {
    pub id: Id,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub cores_number: u32,
    pub speed: f64,
    pub ram_size: u64,
    pub assigned_command: Option<Id>,
    pub archived: bool,
}

impl From<&RenderNode> for RenderNodeResponse {
    fn from(rn: &RenderNode) -> Self {
        Self {
            id: rn.id,
            name: rn.name.clone(),
            host: rn.host.clone(),
            port: rn.port,
            cores_number: rn.cores_number,
            speed: rn.speed,
            ram_size: rn.ram_size,
            assigned_command: rn.assigned_command,
            archived: rn.archived,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_an_empty_host() {
        let req = RegisterRenderNodeRequest {
            name: "rn01".into(),
            host: "".into(),
            port: 8000,
            cores_number: 4,
            speed: 1.0,
            ram_size: 0,
            characteristics: HashMap::new(),
        };
        assert!(req.validate().is_err());
    }
}
