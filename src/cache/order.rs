//! Insertion Order Module
//!
//! Keeps a stable iteration order over cache keys for eviction.

use std::collections::VecDeque;

use crate::cache::CacheKey;

// == Insertion Order ==
/// Tracks the order in which keys were last inserted.
///
/// Keys are stored in a VecDeque where:
/// - Front = Inserted longest ago
/// - Back = Inserted most recently
#[derive(Debug, Default)]
pub struct InsertionOrder {
    /// Keys by insertion time
    order: VecDeque<CacheKey>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record ==
    /// Marks a key as just inserted (moves to back).
    ///
    /// An overwritten key loses its old position.
    pub fn record(&mut self, key: &CacheKey) {
        self.remove(key);
        self.order.push_back(key.clone());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
    }

    // == Retain ==
    /// Keeps only the keys for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&CacheKey) -> bool,
    {
        self.order.retain(|k| keep(k));
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Iterate ==
    /// Iterates keys from oldest insertion to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> {
        self.order.iter()
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
