//! Repository for the `pool_shares` table.

use crate::db::connection::DatabasePool;
use crate::db::models::PoolShareRow;

pub struct PoolShareRepository;

impl PoolShareRepository {
    pub async fn create(pool: &DatabasePool, row: &PoolShareRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO pool_shares (id, pool_id, node_id, max_rn, archived) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(row.pool_id)
        .bind(row.node_id)
        .bind(row.max_rn)
        .bind(row.archived)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update(pool: &DatabasePool, row: &PoolShareRow) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pool_shares SET max_rn = ?, archived = ? WHERE id = ?")
            .bind(row.max_rn)
            .bind(row.archived)
            .bind(row.id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &DatabasePool, id: i64) -> Result<Option<PoolShareRow>, sqlx::Error> {
        sqlx::query_as::<_, PoolShareRow>("SELECT * FROM pool_shares WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<PoolShareRow>, sqlx::Error> {
        sqlx::query_as::<_, PoolShareRow>("SELECT * FROM pool_shares ORDER BY id")
            .fetch_all(pool)
            .await
    }
}
