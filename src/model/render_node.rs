//! Workers, pools and quota shares.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::Id;

/// A worker host.
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub id: Id,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub cores_number: u32,
    pub speed: f64,
    pub ram_size: u64,
    pub characteristics: HashMap<String, String>,
    pub pools: HashSet<Id>,
    pub assigned_command: Option<Id>,
    pub last_heartbeat: DateTime<Utc>,
    pub archived: bool,
}

impl RenderNode {
    pub fn new(id: Id, name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id,
            name: name.into(),
            host: host.into(),
            port,
            cores_number: 1,
            speed: 1.0,
            ram_size: 0,
            characteristics: HashMap::new(),
            pools: HashSet::new(),
            assigned_command: None,
            last_heartbeat: Utc::now(),
            archived: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.assigned_command.is_none()
    }

    /// Whether the heartbeat is within `timeout` of now.
    pub fn is_reachable(&self, timeout: chrono::Duration) -> bool {
        Utc::now().signed_duration_since(self.last_heartbeat) <= timeout
    }

    /// Requirement predicates are a conjunction of key-op-value checks over
    /// characteristics plus synthetic `cores`/`ram` keys.
    pub fn satisfies(&self, requirements: &HashMap<String, String>) -> bool {
        requirements.iter().all(|(key, expected)| match key.as_str() {
            "cores" => expected
                .parse::<u32>()
                .map(|n| self.cores_number >= n)
                .unwrap_or(false),
            "ram" => expected
                .parse::<u64>()
                .map(|n| self.ram_size >= n)
                .unwrap_or(false),
            _ => self.characteristics.get(key) == Some(expected),
        })
    }
}

/// A named collection of render nodes.
#[derive(Debug, Clone)]
pub struct Pool {
    pub id: Id,
    pub name: String,
    pub archived: bool,
}

impl Pool {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            archived: false,
        }
    }
}

/// A quota binding granting a subtree access to up to `max_rn` concurrent
/// workers from `pool_id`.
#[derive(Debug, Clone)]
pub struct PoolShare {
    pub id: Id,
    pub pool_id: Id,
    pub node_id: Id,
    pub max_rn: i32,
    pub archived: bool,
}

impl PoolShare {
    pub fn new(id: Id, pool_id: Id, node_id: Id, max_rn: i32) -> Self {
        Self {
            id,
            pool_id,
            node_id,
            max_rn,
            archived: false,
        }
    }

    /// Remaining capacity given the number of commands from this pool
    /// currently RUNNING in the bound subtree. -1 (unlimited) never runs out.
    pub fn remaining_capacity(&self, running: u32) -> Option<u32> {
        if self.max_rn < 0 {
            None
        } else {
            Some((self.max_rn as u32).saturating_sub(running))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_node_satisfies_cores_and_characteristics() {
        let mut rn = RenderNode::new(1, "rn01", "10.0.0.1", 8000);
        rn.cores_number = 16;
        rn.characteristics.insert("os".to_string(), "linux".to_string());

        let mut reqs = HashMap::new();
        reqs.insert("cores".to_string(), "8".to_string());
        reqs.insert("os".to_string(), "linux".to_string());
        assert!(rn.satisfies(&reqs));

        reqs.insert("os".to_string(), "windows".to_string());
        assert!(!rn.satisfies(&reqs));
    }

    #[test]
    fn idle_render_node_has_no_assigned_command() {
        let rn = RenderNode::new(1, "rn01", "10.0.0.1", 8000);
        assert!(rn.is_idle());
    }

    #[test]
    fn unlimited_pool_share_never_runs_out() {
        let share = PoolShare::new(1, 1, 1, -1);
        assert_eq!(share.remaining_capacity(1_000), None);
    }

    #[test]
    fn pool_share_remaining_capacity_saturates_at_zero() {
        let share = PoolShare::new(1, 1, 1, 2);
        assert_eq!(share.remaining_capacity(0), Some(2));
        assert_eq!(share.remaining_capacity(5), Some(0));
    }
}
