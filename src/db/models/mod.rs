//! Database row models
//!
//! One row type per entity class the dispatch tree persists, matching
//! `tree::EntityRef`'s variants. All timestamp fields are stored as
//! ISO8601 strings (TEXT in SQLite) due to sqlx and SQLite's type
//! limitations with `chrono::DateTime<Utc>`. Arguments/environment/
//! requirements/tags maps and dependency edge lists are stored as JSON text
//! columns rather than normalized side tables.

pub mod command;
pub mod folder_node;
pub mod pool;
pub mod pool_share;
pub mod render_node;
pub mod rule;
pub mod task;
pub mod task_group;
pub mod task_node;

pub use command::CommandRow;
pub use folder_node::FolderNodeRow;
pub use pool::PoolRow;
pub use pool_share::PoolShareRow;
pub use render_node::RenderNodeRow;
pub use rule::RuleRow;
pub use task::TaskRow;
pub use task_group::TaskGroupRow;
pub use task_node::TaskNodeRow;
