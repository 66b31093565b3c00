//! Repository for the `tasks` table.

use crate::db::connection::DatabasePool;
use crate::db::models::TaskRow;

pub struct TaskRepository;

impl TaskRepository {
    pub async fn create(pool: &DatabasePool, row: &TaskRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tasks
             (id, name, runner, arguments, environment, requirements, tags, min_nb_cores,
              max_nb_cores, ram_use, licence, validation_expression, max_attempt, timer, decomposed)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.runner)
        .bind(&row.arguments)
        .bind(&row.environment)
        .bind(&row.requirements)
        .bind(&row.tags)
        .bind(row.min_nb_cores)
        .bind(row.max_nb_cores)
        .bind(row.ram_use)
        .bind(&row.licence)
        .bind(&row.validation_expression)
        .bind(row.max_attempt)
        .bind(row.timer)
        .bind(row.decomposed)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &TaskRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET name = ?, runner = ?, arguments = ?, environment = ?,
             requirements = ?, tags = ?, min_nb_cores = ?, max_nb_cores = ?, ram_use = ?,
             licence = ?, validation_expression = ?, max_attempt = ?, timer = ?,
             decomposed = ? WHERE id = ?",
        )
        .bind(&row.name)
        .bind(&row.runner)
        .bind(&row.arguments)
        .bind(&row.environment)
        .bind(&row.requirements)
        .bind(&row.tags)
        .bind(row.min_nb_cores)
        .bind(row.max_nb_cores)
        .bind(row.ram_use)
        .bind(&row.licence)
        .bind(&row.validation_expression)
        .bind(row.max_attempt)
        .bind(row.timer)
        .bind(row.decomposed)
        .bind(row.id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<TaskRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<TaskRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DatabaseConnection;

    fn sample_row() -> TaskRow {
        TaskRow {
            id: 1,
            name: "render".into(),
            runner: "shell".into(),
            arguments: "{}".into(),
            environment: "{}".into(),
            requirements: "{}".into(),
            tags: "{}".into(),
            min_nb_cores: 1,
            max_nb_cores: 4,
            ram_use: 2048,
            licence: None,
            validation_expression: None,
            max_attempt: 2,
            timer: None,
            decomposed: false,
        }
    }

    #[tokio::test]
    async fn create_then_fetch_a_task() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();

        TaskRepository::create(conn.pool(), &sample_row()).await.unwrap();

        let fetched = TaskRepository::get_by_id(conn.pool(), 1).await.unwrap().unwrap();
        assert_eq!(fetched.name, "render");
        assert_eq!(fetched.max_nb_cores, 4);
    }

    #[tokio::test]
    async fn update_marks_a_task_decomposed() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();

        TaskRepository::create(conn.pool(), &sample_row()).await.unwrap();
        let mut row = sample_row();
        row.decomposed = true;
        TaskRepository::update(conn.pool(), &row).await.unwrap();

        let fetched = TaskRepository::get_by_id(conn.pool(), 1).await.unwrap().unwrap();
        assert!(fetched.decomposed);
    }
}
