//! Repository for the `folder_nodes` table.

use crate::db::connection::DatabasePool;
use crate::db::models::FolderNodeRow;

pub struct FolderNodeRepository;

impl FolderNodeRepository {
    pub async fn create(pool: &DatabasePool, row: &FolderNodeRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO folder_nodes
             (id, name, parent, user, priority, dispatch_key, max_rn, creation_time,
              start_time, update_time, end_time, archived, dependencies, status,
              task_group_id, strategy)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
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
        .bind(row.task_group_id)
        .bind(&row.strategy)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &FolderNodeRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE folder_nodes SET name = ?, parent = ?, user = ?, priority = ?,
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

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<FolderNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, FolderNodeRow>("SELECT * FROM folder_nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<FolderNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, FolderNodeRow>("SELECT * FROM folder_nodes ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DatabaseConnection;

    #[tokio::test]
    async fn create_then_fetch_a_folder_node() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();
        sqlx::query("INSERT INTO task_groups (id, name) VALUES (1, 'shots')")
            .execute(conn.pool())
            .await
            .unwrap();

        let now = chrono::Utc::now().to_rfc3339();
        let row = FolderNodeRow {
            id: 1,
            name: "shots".into(),
            parent: None,
            user: "alice".into(),
            priority: 0,
            dispatch_key: 0.0,
            max_rn: -1,
            creation_time: now.clone(),
            start_time: None,
            update_time: now,
            end_time: None,
            archived: false,
            dependencies: "[]".into(),
            status: 0,
            task_group_id: 1,
            strategy: "Fifo".into(),
        };
        FolderNodeRepository::create(conn.pool(), &row).await.unwrap();

        let fetched = FolderNodeRepository::get_by_id(conn.pool(), 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.task_group_id, 1);
    }
}
