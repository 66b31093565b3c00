//! Repository for the `task_groups` table.

use crate::db::connection::DatabasePool;
use crate::db::models::TaskGroupRow;

pub struct TaskGroupRepository;

impl TaskGroupRepository {
    pub async fn create(pool: &DatabasePool, row: &TaskGroupRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO task_groups (id, name, arguments, environment, requirements, tags, strategy)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.arguments)
        .bind(&row.environment)
        .bind(&row.requirements)
        .bind(&row.tags)
        .bind(&row.strategy)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &TaskGroupRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE task_groups SET name = ?, arguments = ?, environment = ?, requirements = ?,
             tags = ?, strategy = ? WHERE id = ?",
        )
        .bind(&row.name)
        .bind(&row.arguments)
        .bind(&row.environment)
        .bind(&row.requirements)
        .bind(&row.tags)
        .bind(&row.strategy)
        .bind(row.id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<TaskGroupRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskGroupRow>("SELECT * FROM task_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<TaskGroupRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskGroupRow>("SELECT * FROM task_groups ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
