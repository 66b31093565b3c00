//! Repository for the `commands` table.

use crate::db::connection::DatabasePool;
use crate::db::models::CommandRow;

pub struct CommandRepository;

impl CommandRepository {
    pub async fn create(pool: &DatabasePool, row: &CommandRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO commands
             (id, description, task_id, status, completion, assigned_render_node,
              start_time, update_time, end_time, message, attempt, arguments)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.description)
        .bind(row.task_id)
        .bind(row.status)
        .bind(row.completion)
        .bind(row.assigned_render_node)
        .bind(&row.start_time)
        .bind(&row.update_time)
        .bind(&row.end_time)
        .bind(&row.message)
        .bind(row.attempt)
        .bind(&row.arguments)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &CommandRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE commands SET description = ?, status = ?, completion = ?,
             assigned_render_node = ?, start_time = ?, update_time = ?, end_time = ?,
             message = ?, attempt = ?, arguments = ? WHERE id = ?",
        )
        .bind(&row.description)
        .bind(row.status)
        .bind(row.completion)
        .bind(row.assigned_render_node)
        .bind(&row.start_time)
        .bind(&row.update_time)
        .bind(&row.end_time)
        .bind(&row.message)
        .bind(row.attempt)
        .bind(&row.arguments)
        .bind(row.id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<CommandRow>, sqlx::Error> {
        sqlx::query_as::<_, CommandRow>("SELECT * FROM commands WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_task(pool: &DatabasePool, task_id: i64) -> Result<Vec<CommandRow>, sqlx::Error> {
        sqlx::query_as::<_, CommandRow>("SELECT * FROM commands WHERE task_id = ? ORDER BY id")
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<CommandRow>, sqlx::Error> {
        sqlx::query_as::<_, CommandRow>("SELECT * FROM commands ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Commands currently bound to a render node, used to reconcile
    /// in-flight assignments on restart.
    pub async fn list_running(pool: &DatabasePool) -> Result<Vec<CommandRow>, sqlx::Error> {
        sqlx::query_as::<_, CommandRow>("SELECT * FROM commands WHERE status = 2 ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
