//! Request Cache - a keyed TTL cache in front of an asynchronous resolver
//!
//! Derives a canonical key from each request, answers repeats from a bounded
//! cache with lazy TTL expiry and oldest-first eviction, and only calls the
//! resolver on a miss.

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;

pub use cache::{CacheKey, CacheStats, Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::CacheError;
pub use executor::{ExecutorBuilder, ExecutorState, PendingRequest, RequestExecutor, Resolver};
