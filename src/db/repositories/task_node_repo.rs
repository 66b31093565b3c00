//! Repository for the `task_nodes` table.

use crate::db::connection::DatabasePool;
use crate::db::models::TaskNodeRow;

pub struct TaskNodeRepository;

impl TaskNodeRepository {
    pub async fn create(pool: &DatabasePool, row: &TaskNodeRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO task_nodes
             (id, name, parent, user, priority, dispatch_key, max_rn, creation_time,
              start_time, update_time, end_time, archived, dependencies, status, task_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(row.parent)
        .bind(&row.user)
        .bind(row.priority)
        .bind(row.dispatch_key)
        .bind(row.max_rn)
        .bind(&row.creation_time)
        .bind(&row.start_time)
        .bind(&row.update_time)
        .bind(&row.end_time)
        .bind(row.archived)
        .bind(&row.dependencies)
        .bind(row.status)
        .bind(row.task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &TaskNodeRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE task_nodes SET name = ?, parent = ?, user = ?, priority = ?,
             dispatch_key = ?, max_rn = ?, start_time = ?, update_time = ?, end_time = ?,
             archived = ?, dependencies = ?, status = ? WHERE id = ?",
        )
        .bind(&row.name)
        .bind(row.parent)
        .bind(&row.user)
        .bind(row.priority)
        .bind(row.dispatch_key)
        .bind(row.max_rn)
        .bind(&row.start_time)
        .bind(&row.update_time)
        .bind(&row.end_time)
        .bind(row.archived)
        .bind(&row.dependencies)
        .bind(row.status)
        .bind(row.id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<TaskNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskNodeRow>("SELECT * FROM task_nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<TaskNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskNodeRow>("SELECT * FROM task_nodes ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
