//! Row model for the `commands` table.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::DatabaseError;
use crate::model::{Command, CommandStatus};

#[derive(Debug, Clone, FromRow)]
pub struct CommandRow {
    pub id: i64,
    pub description: String,
    pub task_id: i64,
    pub status: i64,
    pub completion: f64,
    pub assigned_render_node: Option<i64>,
    pub start_time: Option<String>,
    pub update_time: String,
    pub end_time: Option<String>,
    pub message: Option<String>,
    pub attempt: i64,
    pub arguments: String,
}

impl From<&Command> for CommandRow {
    fn from(c: &Command) -> Self {
        Self {
            id: c.id,
            description: c.description.clone(),
            task_id: c.task_id,
            status: c.status.as_u8() as i64,
            completion: c.completion as f64,
            assigned_render_node: c.assigned_render_node,
            start_time: c.start_time.map(|t| t.to_rfc3339()),
            update_time: c.update_time.to_rfc3339(),
            end_time: c.end_time.map(|t| t.to_rfc3339()),
            message: c.message.clone(),
            attempt: c.attempt as i64,
            arguments: serde_json::to_string(&c.arguments).unwrap_or_default(),
        }
    }
}

impl TryFrom<CommandRow> for Command {
    type Error = DatabaseError;

    fn try_from(row: CommandRow) -> Result<Self, Self::Error> {
        let mut cmd = Command::new(row.id, row.task_id, row.description);
        cmd.status = CommandStatus::from_u8(row.status as u8)
            .ok_or_else(|| DatabaseError::type_error(format!("invalid command status {}", row.status)))?;
        cmd.completion = row.completion as f32;
        cmd.assigned_render_node = row.assigned_render_node;
        cmd.start_time = parse_opt_time(row.start_time)?;
        cmd.update_time = parse_time(&row.update_time)?;
        cmd.end_time = parse_opt_time(row.end_time)?;
        cmd.message = row.message;
        cmd.attempt = row.attempt as u32;
        cmd.arguments = if row.arguments.is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(&row.arguments).map_err(|e| DatabaseError::type_error(e.to_string()))?
        };
        Ok(cmd)
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::type_error(e.to_string()))
}

fn parse_opt_time(raw: Option<String>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    raw.map(|s| parse_time(&s)).transpose()
}
