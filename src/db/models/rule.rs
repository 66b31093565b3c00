//! Row model for the `rules` table: a named child slot, pointing at exactly
//! one of a `folder_nodes` or a `task_nodes` row.

use sqlx::FromRow;

use crate::model::Rule;

#[derive(Debug, Clone, FromRow)]
pub struct RuleRow {
    pub id: i64,
    pub name: String,
    pub task_node_id: Option<i64>,
    pub folder_node_id: Option<i64>,
}

impl From<&Rule> for RuleRow {
    fn from(r: &Rule) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            task_node_id: r.task_node_id,
            folder_node_id: r.folder_node_id,
        }
    }
}

impl From<RuleRow> for Rule {
    fn from(row: RuleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            task_node_id: row.task_node_id,
            folder_node_id: row.folder_node_id,
        }
    }
}
