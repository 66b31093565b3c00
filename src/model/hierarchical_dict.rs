//! Two-level argument/environment inheritance.
//!
//! A node's argument (or environment) lookup returns its own key if present,
//! otherwise recurses into its parent's map. Mutation never propagates
//! upward, and serialization only ever emits a node's own map: ancestor
//! values are resolved lazily on read, never copied down.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// A string→string map that falls back to a parent `HierarchicalDict` on miss.
#[derive(Debug, Default)]
pub struct HierarchicalDict {
    own: RwLock<HashMap<String, String>>,
    parent: Option<Weak<HierarchicalDict>>,
}

impl HierarchicalDict {
    /// A root dict with no parent to fall back to.
    pub fn new(own: HashMap<String, String>) -> Self {
        Self {
            own: RwLock::new(own),
            parent: None,
        }
    }

    /// A dict that inherits from `parent` on miss.
    pub fn with_parent(own: HashMap<String, String>, parent: &Arc<HierarchicalDict>) -> Self {
        Self {
            own: RwLock::new(own),
            parent: Some(Arc::downgrade(parent)),
        }
    }

    /// Look up `key`, falling back through the parent chain. Returns `None`
    /// only if no ancestor (including self) defines the key.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.own.read().get(key) {
            return Some(value.clone());
        }
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|parent| parent.get(key))
    }

    /// Set `key` on this node's own map. Never visible to the parent.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.own.write().insert(key.into(), value.into());
    }

    /// This node's own map, unflattened: the form serialized on the wire.
    pub fn own_map(&self) -> HashMap<String, String> {
        self.own.read().clone()
    }

    /// Flatten the whole chain into a single map (parent values first, own
    /// values override), used only when handing a command to a worker.
    pub fn flatten(&self) -> HashMap<String, String> {
        let mut flattened = self
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|parent| parent.flatten())
            .unwrap_or_default();
        flattened.extend(self.own.read().clone());
        flattened
    }
}
