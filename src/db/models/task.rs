//! Row model for the `tasks` table.

use std::collections::HashMap;

use sqlx::FromRow;

use crate::db::DatabaseError;
use crate::model::Task;

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub name: String,
    pub runner: String,
    pub arguments: String,
    pub environment: String,
    pub requirements: String,
    pub tags: String,
    pub min_nb_cores: i64,
    pub max_nb_cores: i64,
    pub ram_use: i64,
    pub licence: Option<String>,
    pub validation_expression: Option<String>,
    pub max_attempt: i64,
    pub timer: Option<f64>,
    pub decomposed: bool,
}

impl From<&Task> for TaskRow {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            runner: t.runner.clone(),
            arguments: serde_json::to_string(&t.arguments).unwrap_or_default(),
            environment: serde_json::to_string(&t.environment).unwrap_or_default(),
            requirements: serde_json::to_string(&t.requirements).unwrap_or_default(),
            tags: serde_json::to_string(&t.tags).unwrap_or_default(),
            min_nb_cores: t.min_nb_cores as i64,
            max_nb_cores: t.max_nb_cores as i64,
            ram_use: t.ram_use as i64,
            licence: t.licence.clone(),
            validation_expression: t.validation_expression.clone(),
            max_attempt: t.max_attempt as i64,
            timer: t.timer,
            decomposed: t.decomposed,
        }
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = DatabaseError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let mut task = Task::new(row.id, row.name, row.runner);
        task.arguments = parse_map(&row.arguments)?;
        task.environment = parse_map(&row.environment)?;
        task.requirements = parse_map(&row.requirements)?;
        task.tags = parse_map(&row.tags)?;
        task.min_nb_cores = row.min_nb_cores as u32;
        task.max_nb_cores = row.max_nb_cores as u32;
        task.ram_use = row.ram_use as u64;
        task.licence = row.licence;
        task.validation_expression = row.validation_expression;
        task.max_attempt = row.max_attempt as u32;
        task.timer = row.timer;
        task.decomposed = row.decomposed;
        Ok(task)
    }
}

fn parse_map(raw: &str) -> Result<HashMap<String, String>, DatabaseError> {
    if raw.is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(raw).map_err(|e| DatabaseError::type_error(e.to_string()))
}
