//! Row model for the `pool_shares` table.

use sqlx::FromRow;

use crate::model::PoolShare;

#[derive(Debug, Clone, FromRow)]
pub struct PoolShareRow {
    pub id: i64,
    pub pool_id: i64,
    pub node_id: i64,
    pub max_rn: i64,
    pub archived: bool,
}

impl From<&PoolShare> for PoolShareRow {
    fn from(s: &PoolShare) -> Self {
        Self {
            id: s.id,
            pool_id: s.pool_id,
            node_id: s.node_id,
            max_rn: s.max_rn as i64,
            archived: s.archived,
        }
    }
}

impl From<PoolShareRow> for PoolShare {
    fn from(row: PoolShareRow) -> Self {
        let mut share = PoolShare::new(row.id, row.pool_id, row.node_id, row.max_rn as i32);
        share.archived = row.archived;
        share
    }
}
