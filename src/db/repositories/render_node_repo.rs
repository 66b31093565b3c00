//! Repository for the `render_nodes` table.

use crate::db::connection::DatabasePool;
use crate::db::models::RenderNodeRow;

pub struct RenderNodeRepository;

impl RenderNodeRepository {
    pub async fn create(pool: &DatabasePool, row: &RenderNodeRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO render_nodes
             (id, name, host, port, cores_number, speed, ram_size, characteristics, pools,
              assigned_command, last_heartbeat, archived)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.host)
        .bind(row.port)
        .bind(row.cores_number)
        .bind(row.speed)
        .bind(row.ram_size)
        .bind(&row.characteristics)
        .bind(&row.pools)
        .bind(row.assigned_command)
        .bind(&row.last_heartbeat)
        .bind(row.archived)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &RenderNodeRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE render_nodes SET name = ?, host = ?, port = ?, cores_number = ?, speed = ?,
             ram_size = ?, characteristics = ?, pools = ?, assigned_command = ?,
             last_heartbeat = ?, archived = ? WHERE id = ?",
        )
        .bind(&row.name)
        .bind(&row.host)
        .bind(row.port)
        .bind(row.cores_number)
        .bind(row.speed)
        .bind(row.ram_size)
        .bind(&row.characteristics)
        .bind(&row.pools)
        .bind(row.assigned_command)
        .bind(&row.last_heartbeat)
        .bind(row.archived)
        .bind(row.id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<RenderNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, RenderNodeRow>("SELECT * FROM render_nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<RenderNodeRow>, sqlx::Error> {
        sqlx::query_as::<_, RenderNodeRow>("SELECT * FROM render_nodes ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DatabaseConnection;

    #[tokio::test]
    async fn create_then_list_render_nodes() {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();

        let row = RenderNodeRow {
            id: 1,
            name: "rn01".into(),
            host: "10.0.0.1".into(),
            port: 8000,
            cores_number: 16,
            speed: 1.0,
            ram_size: 0,
            characteristics: "{}".into(),
            pools: "[]".into(),
            assigned_command: None,
            last_heartbeat: chrono::Utc::now().to_rfc3339(),
            archived: false,
        };
        RenderNodeRepository::create(conn.pool(), &row).await.unwrap();

        let all = RenderNodeRepository::list(conn.pool()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "rn01");
    }
}
