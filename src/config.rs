//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default time-to-live for cached results (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

/// Default maximum number of live entries
pub const DEFAULT_CAPACITY: usize = 100;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a cached result stays live
    pub ttl: Duration,
    /// Maximum number of entries the cache can hold, never below 1
    pub capacity: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REQUEST_CACHE_TTL_MS` - Entry TTL in milliseconds (default: 300000)
    /// - `REQUEST_CACHE_CAPACITY` - Maximum live entries (default: 100)
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    ///
    /// Missing, unparseable and zero values fall back to the defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_ms = lookup("REQUEST_CACHE_TTL_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0);
        let capacity = lookup("REQUEST_CACHE_CAPACITY")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0);

        Self {
            ttl: ttl_ms.map(Duration::from_millis).unwrap_or(DEFAULT_TTL),
            capacity: capacity.unwrap_or(DEFAULT_CAPACITY),
        }
    }

    /// Sets the entry time-to-live
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the maximum number of entries; zero is raised to one
    #[must_use = "This method returns a new CacheConfig and does not modify self"]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// TTL in whole milliseconds, as compared against entry age.
    pub fn ttl_ms(&self) -> u64 {
        u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}
