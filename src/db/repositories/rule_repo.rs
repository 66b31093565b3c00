//! Repository for the `rules` table. Rules are immutable once bound (there
//! is no `update`) and never archived: a named slot carries no
//! scheduling-relevant state of its own, only a pointer to a child that is
//! archived, if at all, on its own row.

use crate::db::connection::DatabasePool;
use crate::db::models::RuleRow;

pub struct RuleRepository;

impl RuleRepository {
    pub async fn create(pool: &DatabasePool, row: &RuleRow) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO rules (id, name, task_node_id, folder_node_id) VALUES (?, ?, ?, ?)")
            .bind(row.id)
            .bind(&row.name)
            .bind(row.task_node_id)
            .bind(row.folder_node_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<RuleRow>, sqlx::Error> {
        sqlx::query_as::<_, RuleRow>("SELECT * FROM rules ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DatabaseConnection;

    #[tokio::test]
    async fn create_then_list_a_rule() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();
        sqlx::query("INSERT INTO task_groups (id, name) VALUES (1, 'shots')")
            .execute(conn.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO folder_nodes
             (id, name, user, creation_time, update_time, task_group_id)
             VALUES (1, 'shots', 'alice', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z', 1)",
        )
        .execute(conn.pool())
        .await
        .unwrap();

        let row = RuleRow {
            id: 1,
            name: "main".into(),
            task_node_id: None,
            folder_node_id: Some(1),
        };
        RuleRepository::create(conn.pool(), &row).await.unwrap();

        let rows = RuleRepository::list(conn.pool()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "main");
        assert_eq!(rows[0].folder_node_id, Some(1));
    }
}
