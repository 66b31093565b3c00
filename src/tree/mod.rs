//! The authoritative in-memory dispatch tree: nodes, tasks, commands, render
//! nodes, pools and shares, plus the incremental persistence queues.

pub mod dispatch_tree;
pub mod ids;

pub use dispatch_tree::{DispatchTree, EntityRef, PersistenceQueues, CREATE_ORDER};
pub use ids::IdAllocator;
