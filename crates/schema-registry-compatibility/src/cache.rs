//! Compatibility-result cache (ambient C4 performance concern). Checking two
//! large schemas against every prior transitive version is pure CPU work, so
//! results are memoized by the pair of content hashes and the mode they were
//! evaluated under.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use schema_registry_core::CompatibilityMode;

use crate::CompatibilityOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub new_schema_hash: u64,
    pub old_schema_hash: u64,
    pub mode: CompatibilityMode,
}

#[derive(Default)]
pub struct CompatibilityCache {
    entries: RwLock<HashMap<CacheKey, CompatibilityOutcome>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CompatibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CompatibilityOutcome> {
        let hit = self.entries.read().get(key).cloned();
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn put(&self, key: CacheKey, outcome: CompatibilityOutcome) {
        self.entries.write().insert(key, outcome);
    }

    /// Drops every cached result that mentions `hash`, as either side of the
    /// pair. Called when a schema is hard-deleted so stale verdicts can't
    /// leak past the schema's lifetime.
    pub fn invalidate_schema(&self, hash: u64) {
        self.entries
            .write()
            .retain(|key, _| key.new_schema_hash != hash && key.old_schema_hash != hash);
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_hits_cache() {
        let cache = CompatibilityCache::new();
        let key = CacheKey { new_schema_hash: 1, old_schema_hash: 2, mode: CompatibilityMode::Backward };
        assert!(cache.get(&key).is_none());
        cache.put(key, CompatibilityOutcome { is_compatible: true, messages: vec![] });
        assert!(cache.get(&key).unwrap().is_compatible);
        let (hits, misses) = cache.stats();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
    }

    #[test]
    fn invalidate_schema_drops_matching_entries() {
        let cache = CompatibilityCache::new();
        let key = CacheKey { new_schema_hash: 1, old_schema_hash: 2, mode: CompatibilityMode::Backward };
        cache.put(key, CompatibilityOutcome { is_compatible: true, messages: vec![] });
        cache.invalidate_schema(1);
        assert!(cache.is_empty());
    }
}
