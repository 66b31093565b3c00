//! Repository for the `pools` table.

use crate::db::connection::DatabasePool;
use crate::db::models::PoolRow;

pub struct PoolRepository;

impl PoolRepository {
    pub async fn create(pool: &DatabasePool, row: &PoolRow) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO pools (id, name, archived) VALUES (?, ?, ?)")
            .bind(row.id)
            .bind(&row.name)
            .bind(row.archived)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &PoolRow) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pools SET name = ?, archived = ? WHERE id = ?")
            .bind(&row.name)
            .bind(row.archived)
            .bind(row.id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<PoolRow>, sqlx::Error> {
        sqlx::query_as::<_, PoolRow>("SELECT * FROM pools WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<PoolRow>, sqlx::Error> {
        sqlx::query_as::<_, PoolRow>("SELECT * FROM pools ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
