//! Process-wide licence token accounting.
//!
//! A single writer mutates this registry, same as the dispatch tree itself;
//! it is not internally synchronized because callers are expected to hold
//! the tree's single-writer discipline already.

use std::collections::HashMap;

/// Per-token concurrency semaphore. `None` capacity means unlimited (no
/// `licence` declared for the token, or the token was never registered with
/// a cap).
#[derive(Debug, Default)]
pub struct LicenceRegistry {
    capacity: HashMap<String, u32>,
    in_use: HashMap<String, u32>,
}

impl LicenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `token`'s total concurrent capacity.
    pub fn set_capacity(&mut self, token: impl Into<String>, capacity: u32) {
        self.capacity.insert(token.into(), capacity);
    }

    /// Attempts to reserve one unit of `token`. Returns `false` (and reserves
    /// nothing) if the token is at capacity. The caller leaves the command
    /// READY and retries next tick (`ResourceExhausted`, retried silently).
    pub fn try_reserve(&mut self, token: &str) -> bool {
        let Some(&cap) = self.capacity.get(token) else {
            // No declared cap: unlimited.
            return true;
        };
        let used = self.in_use.entry(token.to_string()).or_insert(0);
        if *used >= cap {
            return false;
        }
        *used += 1;
        true
    }

    /// Releases one unit of `token` on command terminal status. No-op for
    /// tokens without a declared capacity.
    pub fn release(&mut self, token: &str) {
        if let Some(used) = self.in_use.get_mut(token) {
            *used = used.saturating_sub(1);
        }
    }

    /// Number of declared tokens currently reserved up to their capacity.
    pub fn exhausted_count(&self) -> usize {
        self.capacity
            .iter()
            .filter(|(token, &cap)| self.in_use(token) >= cap)
            .count()
    }

    pub fn in_use(&self, token: &str) -> u32 {
        *self.in_use.get(token).unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_token_always_reserves() {
        let mut reg = LicenceRegistry::new();
        assert!(reg.try_reserve("nuke"));
        assert!(reg.try_reserve("nuke"));
    }

    #[test]
    fn capped_token_exhausts_then_releases() {
        let mut reg = LicenceRegistry::new();
        reg.set_capacity("nuke", 1);
        assert!(reg.try_reserve("nuke"));
        assert!(!reg.try_reserve("nuke"));
        reg.release("nuke");
        assert!(reg.try_reserve("nuke"));
    }

    #[test]
    fn exhausted_count_reflects_only_capped_tokens_at_capacity() {
        let mut reg = LicenceRegistry::new();
        reg.set_capacity("nuke", 1);
        reg.set_capacity("maya", 4);
        reg.try_reserve("nuke");
        assert_eq!(reg.exhausted_count(), 1);
    }

    #[test]
    fn release_below_zero_saturates() {
        let mut reg = LicenceRegistry::new();
        reg.set_capacity("nuke", 1);
        reg.release("nuke");
        assert_eq!(reg.in_use("nuke"), 0);
    }
}
