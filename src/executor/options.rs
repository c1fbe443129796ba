//! Executor Options
//!
//! Builder for [`RequestExecutor`] and the optional hit/miss callbacks.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::cache::{CacheKey, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::executor::{RequestExecutor, Resolver};

/// Callback invoked with the key of a cache hit or miss.
pub type KeyHook = Arc<dyn Fn(&CacheKey) + Send + Sync>;

// == Cache Hooks ==
/// Optional observers for cache lookups.
///
/// Each runs synchronously, once per event, after the stats are updated and
/// before the lookup result reaches the caller. The store lock is released
/// first, so a hook may read the executor's stats.
#[derive(Clone, Default)]
pub struct CacheHooks {
    on_hit: Option<KeyHook>,
    on_miss: Option<KeyHook>,
}

impl CacheHooks {
    pub(crate) fn hit(&self, key: &CacheKey) {
        if let Some(hook) = &self.on_hit {
            hook(key);
        }
    }

    pub(crate) fn miss(&self, key: &CacheKey) {
        if let Some(hook) = &self.on_miss {
            hook(key);
        }
    }
}

impl fmt::Debug for CacheHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHooks")
            .field("on_hit", &self.on_hit.is_some())
            .field("on_miss", &self.on_miss.is_some())
            .finish()
    }
}

// == Executor Builder ==
/// Configures and builds a [`RequestExecutor`].
///
/// # Example
/// ```ignore
/// let executor = RequestExecutor::builder(resolver)
///     .ttl(Duration::from_secs(60))
///     .capacity(500)
///     .on_cache_miss(|key| tracing::info!(%key, "fetching"))
///     .build();
/// ```
pub struct ExecutorBuilder<R, Res, C = SystemClock> {
    resolver: Res,
    config: CacheConfig,
    hooks: CacheHooks,
    runtime: Option<Handle>,
    clock: C,
    _request: PhantomData<fn(R)>,
}

impl<R, Res> ExecutorBuilder<R, Res, SystemClock> {
    /// Starts a builder with default settings on the system clock.
    pub fn new(resolver: Res) -> Self {
        Self {
            resolver,
            config: CacheConfig::default(),
            hooks: CacheHooks::default(),
            runtime: None,
            clock: SystemClock,
            _request: PhantomData,
        }
    }
}

impl<R, Res, C> ExecutorBuilder<R, Res, C> {
    /// Replaces TTL and capacity with `config`.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how long a resolved value stays cached.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config = self.config.with_ttl(ttl);
        self
    }

    /// Sets the maximum number of live entries.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_capacity(capacity);
        self
    }

    /// Called with the key of every cache hit.
    pub fn on_cache_hit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CacheKey) + Send + Sync + 'static,
    {
        self.hooks.on_hit = Some(Arc::new(hook));
        self
    }

    /// Called with the key of every cache miss, expiry included.
    pub fn on_cache_miss<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CacheKey) + Send + Sync + 'static,
    {
        self.hooks.on_miss = Some(Arc::new(hook));
        self
    }

    /// Runtime that eager calls are spawned on.
    ///
    /// Defaults to the runtime current at the time of each call.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Swaps the time source.
    pub fn clock<C2: Clock>(self, clock: C2) -> ExecutorBuilder<R, Res, C2> {
        ExecutorBuilder {
            resolver: self.resolver,
            config: self.config,
            hooks: self.hooks,
            runtime: self.runtime,
            clock,
            _request: PhantomData,
        }
    }

    /// Builds the executor with an empty cache.
    pub fn build(self) -> RequestExecutor<R, Res, C>
    where
        Res: Resolver<R>,
        C: Clock,
    {
        RequestExecutor::from_parts(
            self.resolver,
            &self.config,
            self.hooks,
            self.runtime,
            self.clock,
        )
    }
}
