//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A resolved value and the time it was stored.
///
/// Entries are never updated in place. A refreshed value replaces the whole
/// entry with a new timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The resolved value, opaque to the cache
    pub value: V,
    /// Insertion timestamp (clock milliseconds)
    pub timestamp: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms`.
    pub fn new(value: V, now_ms: u64) -> Self {
        Self {
            value,
            timestamp: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds since insertion, zero if the clock went backwards.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl_ms`.
    ///
    /// Boundary condition: an entry whose age equals the TTL exactly is still
    /// live. It expires once the age is strictly greater.
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) > ttl_ms
    }
}
