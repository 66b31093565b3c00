//! Row model for the `task_groups` table.

use std::collections::HashMap;

use sqlx::FromRow;

use crate::db::DatabaseError;
use crate::model::{Strategy, TaskGroup};

#[derive(Debug, Clone, FromRow)]
pub struct TaskGroupRow {
    pub id: i64,
    pub name: String,
    pub arguments: String,
    pub environment: String,
    pub requirements: String,
    pub tags: String,
    pub strategy: String,
}

impl From<&TaskGroup> for TaskGroupRow {
    fn from(g: &TaskGroup) -> Self {
        Self {
            id: g.id,
            name: g.name.clone(),
            arguments: serde_json::to_string(&g.arguments).unwrap_or_default(),
            environment: serde_json::to_string(&g.environment).unwrap_or_default(),
            requirements: serde_json::to_string(&g.requirements).unwrap_or_default(),
            tags: serde_json::to_string(&g.tags).unwrap_or_default(),
            strategy: format!("{:?}", g.strategy),
        }
    }
}

impl TryFrom<TaskGroupRow> for TaskGroup {
    type Error = DatabaseError;

    fn try_from(row: TaskGroupRow) -> Result<Self, Self::Error> {
        let mut group = TaskGroup::new(row.id, row.name).with_strategy(
            row.strategy
                .parse::<Strategy>()
                .map_err(DatabaseError::type_error)?,
        );
        group.arguments = parse_map(&row.arguments)?;
        group.environment = parse_map(&row.environment)?;
        group.requirements = parse_map(&row.requirements)?;
        group.tags = parse_map(&row.tags)?;
        Ok(group)
    }
}

fn parse_map(raw: &str) -> Result<HashMap<String, String>, DatabaseError> {
    if raw.is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(raw).map_err(|e| DatabaseError::type_error(e.to_string()))
}
