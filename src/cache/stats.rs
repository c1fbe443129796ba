//! Cache Statistics Module
//!
//! Counters describing how often requests were answered from the cache.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of how an executor's cache has been used.
///
/// `hits` and `misses` only grow for the lifetime of the owning cache.
/// Clearing the cache does not reset them. `size` is copied from the live
/// store whenever a snapshot is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests answered from a live entry
    pub hits: u64,
    /// Requests that went to the resolver (key absent or expired)
    pub misses: u64,
    /// Resolved values currently held
    pub size: usize,
    /// Values dropped to stay within capacity
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Fresh counters for a new executor's cache.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Share of requests answered without calling the resolver.
    ///
    /// 0.0 before the first request.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// A request was served from a live entry.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// A request had to go to the resolver.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// A resolved value pushed the oldest entry out.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Snapshot ==
    /// Detached copy for callers, carrying the store's current entry count.
    pub fn snapshot(&self, size: usize) -> Self {
        Self { size, ..*self }
    }
}
