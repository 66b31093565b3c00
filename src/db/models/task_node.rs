//! Row model for the `task_nodes` table: `NodeCommon` fields shared with
//! `folder_nodes`, plus the owned `Task` id.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::folder_node::{decode_dependencies, encode_dependencies};
use crate::db::DatabaseError;
use crate::model::{CommandStatus, NodeCommon, TaskNode};

#[derive(Debug, Clone, FromRow)]
pub struct TaskNodeRow {
    pub id: i64,
    pub name: String,
    pub parent: Option<i64>,
    pub user: String,
    pub priority: i64,
    pub dispatch_key: f64,
    pub max_rn: i64,
    pub creation_time: String,
    pub start_time: Option<String>,
    pub update_time: String,
    pub end_time: Option<String>,
    pub archived: bool,
    pub dependencies: String,
    pub status: i64,
    pub task_id: i64,
}

impl From<&TaskNode> for TaskNodeRow {
    fn from(t: &TaskNode) -> Self {
        Self {
            id: t.common.id,
            name: t.common.name.clone(),
            parent: t.common.parent,
            user: t.common.user.clone(),
            priority: t.common.priority as i64,
            dispatch_key: t.common.dispatch_key,
            max_rn: t.common.max_rn as i64,
            creation_time: t.common.creation_time.to_rfc3339(),
            start_time: t.common.start_time.map(|ts| ts.to_rfc3339()),
            update_time: t.common.update_time.to_rfc3339(),
            end_time: t.common.end_time.map(|ts| ts.to_rfc3339()),
            archived: t.common.archived,
            dependencies: encode_dependencies(&t.common.dependencies),
            status: t.common.status.as_u8() as i64,
            task_id: t.task_id,
        }
    }
}

impl TryFrom<TaskNodeRow> for TaskNode {
    type Error = DatabaseError;

    fn try_from(row: TaskNodeRow) -> Result<Self, Self::Error> {
        let mut common = NodeCommon::new(row.id, row.name, row.user);
        common.parent = row.parent;
        common.priority = row.priority as i32;
        common.dispatch_key = row.dispatch_key;
        common.max_rn = row.max_rn as i32;
        common.creation_time = parse_time(&row.creation_time)?;
        common.start_time = parse_opt_time(row.start_time)?;
        common.update_time = parse_time(&row.update_time)?;
        common.end_time = parse_opt_time(row.end_time)?;
        common.archived = row.archived;
        common.dependencies = decode_dependencies(&row.dependencies)?;
        common.status = CommandStatus::from_u8(row.status as u8)
            .ok_or_else(|| DatabaseError::type_error(format!("invalid node status {}", row.status)))?;
        Ok(TaskNode {
            common,
            task_id: row.task_id,
        })
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
