//! Row model for the `pools` table.

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PoolRow {
    pub id: i64,
    pub name: String,
    pub archived: bool,
}

impl From<&crate::model::Pool> for PoolRow {
    fn from(pool: &crate::model::Pool) -> Self {
        Self {
            id: pool.id,
            name: pool.name.clone(),
            archived: pool.archived,
        }
    }
}

impl From<PoolRow> for crate::model::Pool {
    fn from(row: PoolRow) -> Self {
        let mut pool = crate::model::Pool::new(row.id, row.name);
        pool.archived = row.archived;
        pool
    }
}
