//! Row model for the `folder_nodes` table: the `NodeCommon` fields shared
//! with `task_nodes`, plus the owned `TaskGroup` id and strategy.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::DatabaseError;
use crate::model::{CommandStatus, DependencyEdge, FolderNode, NodeCommon, Strategy};

#[derive(Debug, Clone, FromRow)]
pub struct FolderNodeRow {
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
    /// JSON array of `[targetId, [statusInt,...]]`.
    pub dependencies: String,
    pub status: i64,
    pub task_group_id: i64,
    pub strategy: String,
}

impl From<&FolderNode> for FolderNodeRow {
    fn from(f: &FolderNode) -> Self {
        Self {
            id: f.common.id,
            name: f.common.name.clone(),
            parent: f.common.parent,
            user: f.common.user.clone(),
            priority: f.common.priority as i64,
            dispatch_key: f.common.dispatch_key,
            max_rn: f.common.max_rn as i64,
            creation_time: f.common.creation_time.to_rfc3339(),
            start_time: f.common.start_time.map(|t| t.to_rfc3339()),
            update_time: f.common.update_time.to_rfc3339(),
            end_time: f.common.end_time.map(|t| t.to_rfc3339()),
            archived: f.common.archived,
            dependencies: encode_dependencies(&f.common.dependencies),
            status: f.common.status.as_u8() as i64,
            task_group_id: f.task_group.id,
            strategy: format!("{:?}", f.strategy),
        }
    }
}

impl FolderNodeRow {
    /// Rebuilds the `NodeCommon` half; the caller supplies the already
    /// loaded `TaskGroup` for `task_group_id`.
    pub fn into_common(self) -> Result<NodeCommon, DatabaseError> {
        let mut common = NodeCommon::new(self.id, self.name, self.user);
        common.parent = self.parent;
        common.priority = self.priority as i32;
        common.dispatch_key = self.dispatch_key;
        common.max_rn = self.max_rn as i32;
        common.creation_time = parse_time(&self.creation_time)?;
        common.start_time = parse_opt_time(self.start_time)?;
        common.update_time = parse_time(&self.update_time)?;
        common.end_time = parse_opt_time(self.end_time)?;
        common.archived = self.archived;
        common.dependencies = decode_dependencies(&self.dependencies)?;
        common.status = CommandStatus::from_u8(self.status as u8)
            .ok_or_else(|| DatabaseError::type_error(format!("invalid node status {}", self.status)))?;
        Ok(common)
    }

    pub fn strategy(&self) -> Result<Strategy, DatabaseError> {
        self.strategy.parse().map_err(DatabaseError::type_error)
    }
}

pub(crate) fn encode_dependencies(edges: &[DependencyEdge]) -> String {
    let raw: Vec<(i64, Vec<u8>)> = edges
        .iter()
        .map(|e| (e.target, e.accepted.iter().map(|s| s.as_u8()).collect()))
        .collect();
    serde_json::to_string(&raw).unwrap_or_default()
}

pub(crate) fn decode_dependencies(raw: &str) -> Result<Vec<DependencyEdge>, DatabaseError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let decoded: Vec<(i64, Vec<u8>)> =
        serde_json::from_str(raw).map_err(|e| DatabaseError::type_error(e.to_string()))?;
    decoded
        .into_iter()
        .map(|(target, statuses)| {
            let accepted = statuses
                .into_iter()
                .map(|s| {
                    CommandStatus::from_u8(s)
                        .ok_or_else(|| DatabaseError::type_error(format!("invalid status ordinal {s}")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DependencyEdge { target, accepted })
        })
        .collect()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::type_error(e.to_string()))
}

fn parse_opt_time(raw: Option<String>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    raw.map(|s| parse_time(&s)).transpose()
}
