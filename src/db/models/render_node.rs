//! Row model for the `render_nodes` table.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RenderNodeRow {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: i64,
    pub cores_number: i64,
    pub speed: f64,
    pub ram_size: i64,
    /// JSON object.
    pub characteristics: String,
    /// JSON array of pool ids.
    pub pools: String,
    pub assigned_command: Option<i64>,
    pub last_heartbeat: String,
    pub archived: bool,
}

impl From<&crate::model::RenderNode> for RenderNodeRow {
    fn from(rn: &crate::model::RenderNode) -> Self {
        Self {
            id: rn.id,
            name: rn.name.clone(),
            host: rn.host.clone(),
            port: rn.port as i64,
            cores_number: rn.cores_number as i64,
            speed: rn.speed,
            ram_size: rn.ram_size as i64,
            characteristics: serde_json::to_string(&rn.characteristics).unwrap_or_default(),
            pools: serde_json::to_string(&rn.pools).unwrap_or_default(),
            assigned_command: rn.assigned_command,
            last_heartbeat: rn.last_heartbeat.to_rfc3339(),
            archived: rn.archived,
        }
    }
}

impl TryFrom<RenderNodeRow> for crate::model::RenderNode {
    type Error = crate::db::DatabaseError;

    fn try_from(row: RenderNodeRow) -> Result<Self, Self::Error> {
        let mut rn = crate::model::RenderNode::new(row.id, row.name, row.host, row.port as u16);
        rn.cores_number = row.cores_number as u32;
        rn.speed = row.speed;
        rn.ram_size = row.ram_size as u64;
        rn.characteristics = serde_json::from_str::<HashMap<String, String>>(&row.characteristics)
            .map_err(|e| crate::db::DatabaseError::type_error(e.to_string()))?;
        rn.pools = serde_json::from_str::<HashSet<i64>>(&row.pools)
            .map_err(|e| crate::db::DatabaseError::type_error(e.to_string()))?;
        rn.assigned_command = row.assigned_command;
        rn.last_heartbeat = DateTime::parse_from_rfc3339(&row.last_heartbeat)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| crate::db::DatabaseError::type_error(e.to_string()))?;
        rn.archived = row.archived;
        Ok(rn)
    }
}
