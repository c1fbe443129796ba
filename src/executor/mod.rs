//! Executor Module
//!
//! Runs requests through the cache with an injected resolver.
//!
//! # Entry Points
//! - `execute` - Lazy: returns a future that does nothing until polled
//! - `execute_promise` - Eager: spawns now, tracks `loading` and `error`
//! - `clear_cache` / `clear_cache_matching` - Drop cached results
//! - `get_cache_stats` - Hit, miss and size snapshot

mod cached;
mod options;
mod pending;
mod resolver;
mod state;

pub use cached::RequestExecutor;
pub use options::{CacheHooks, ExecutorBuilder, KeyHook};
pub use pending::PendingRequest;
pub use resolver::Resolver;
pub use state::ExecutorState;
