//! Per-entity-class monotonic id allocation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::model::Id;

/// One counter per logical entity class (FolderNodes, TaskNodes, Tasks,
/// Commands, ...). Restart restore seeds each counter to the observed max id
/// plus one; fresh submissions just start at 1.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counters: HashMap<&'static str, AtomicI64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    /// Next id for `class`, starting at 1.
    pub fn next(&mut self, class: &'static str) -> Id {
        self.counters
            .entry(class)
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(1, Ordering::Relaxed)
            + 1
    }

    /// Seeds `class`'s counter so the next `next()` call returns at least
    /// `observed_max + 1`. Used by restart restore; never lowers a counter
    /// that has already advanced past it.
    pub fn observe(&mut self, class: &'static str, observed_max: Id) {
        let counter = self
            .counters
            .entry(class)
            .or_insert_with(|| AtomicI64::new(0));
        counter.fetch_max(observed_max, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_increasing_ids_per_class() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.next("Tasks"), 1);
        assert_eq!(alloc.next("Tasks"), 2);
        assert_eq!(alloc.next("Commands"), 1);
    }

    #[test]
    fn observe_seeds_counter_above_restored_max() {
        let mut alloc = IdAllocator::new();
        alloc.observe("Tasks", 41);
        assert_eq!(alloc.next("Tasks"), 42);
    }

    #[test]
    fn observe_never_rewinds_an_advanced_counter() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.next("Tasks"), 1);
        alloc.observe("Tasks", 0);
        assert_eq!(alloc.next("Tasks"), 2);
    }
}
