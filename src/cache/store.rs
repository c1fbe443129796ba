//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with insertion-order tracking,
//! lazy TTL expiration and capacity eviction.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats, Clock, InsertionOrder, SystemClock};
use crate::config::CacheConfig;

// == Lookup ==
/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// A live entry was found
    Hit(V),
    /// Nothing live under this key (absent or expired)
    Miss,
}

impl<V> Lookup<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

// == Cache Store ==
/// Bounded key-value storage with TTL expiry and oldest-first eviction.
///
/// Expiry is lazy: an entry past its TTL is only removed when it is looked
/// up, and keeps its capacity slot until then.
#[derive(Debug)]
pub struct CacheStore<V, C = SystemClock> {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry<V>>,
    /// Stable order for the eviction scan
    order: InsertionOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Entry lifetime in milliseconds
    ttl_ms: u64,
    /// Time source for stamping and aging entries
    clock: C,
}

impl<V> CacheStore<V, SystemClock> {
    // == Constructor ==
    /// Creates a new store on the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<V, C: Clock> CacheStore<V, C> {
    /// Creates a new store reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            capacity: config.capacity.max(1),
            ttl_ms: config.ttl_ms(),
            clock,
        }
    }

    // == Lookup ==
    /// Looks up a live value by key.
    ///
    /// Records exactly one hit or one miss. An expired entry is removed and
    /// reported as a miss.
    pub fn lookup(&mut self, key: &CacheKey) -> Lookup<V>
    where
        V: Clone,
    {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now, self.ttl_ms) => {
                debug!(
                    key = %key,
                    age_ms = entry.age_ms(now),
                    "cache entry expired"
                );
                self.entries.remove(key);
                self.order.remove(key);
                self.stats.record_miss();
                Lookup::Miss
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Lookup::Hit(value)
            }
            None => {
                self.stats.record_miss();
                Lookup::Miss
            }
        }
    }

    // == Insert ==
    /// Stores a value stamped with the current time.
    ///
    /// If the store is at capacity before the insert, the oldest entry is
    /// evicted first. This applies to overwrites too. Returns the evicted key.
    pub fn insert(&mut self, key: CacheKey, value: V) -> Option<CacheKey> {
        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let entry = CacheEntry::new(value, self.clock.now_ms());
        self.order.record(&key);
        self.entries.insert(key, entry);

        evicted
    }

    // == Evict Oldest ==
    /// Removes the entry with the smallest timestamp.
    ///
    /// Ties go to the first one met in insertion order.
    fn evict_oldest(&mut self) -> Option<CacheKey> {
        let victim = self.oldest_key()?;

        self.entries.remove(&victim);
        self.order.remove(&victim);
        self.stats.record_eviction();
        debug!(key = %victim, "evicted oldest cache entry");

        Some(victim)
    }

    /// Returns the eviction candidate without removing it.
    pub fn oldest_key(&self) -> Option<CacheKey> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| (key, entry.timestamp)))
            .fold(None, |oldest: Option<(&CacheKey, u64)>, (key, ts)| match oldest {
                Some((_, min)) if ts >= min => oldest,
                _ => Some((key, ts)),
            })
            .map(|(key, _)| key.clone())
    }

    // == Clear ==
    /// Removes every entry. Hit and miss counters are kept.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.order.clear();
        removed
    }

    /// Removes entries whose key satisfies `predicate`.
    ///
    /// Returns the number of entries removed.
    pub fn clear_matching<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&CacheKey) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));
        let entries = &self.entries;
        self.order.retain(|key| entries.contains_key(key));
        before - self.entries.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    // == Accessors ==
    /// Returns true if an entry exists for `key`, live or not.
    ///
    /// Does not check expiry and does not count as a lookup.
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }
}
