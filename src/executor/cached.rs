//! Cached Request Executor
//!
//! Runs requests through the cache, falling back to the resolver on a miss.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStats, CacheStore, Clock, Lookup, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::executor::{CacheHooks, ExecutorBuilder, ExecutorState, PendingRequest, Resolver};

type Output<R, Res> = <Res as Resolver<R>>::Output;
type Failure<R, Res> = <Res as Resolver<R>>::Error;

// == Request Executor ==
/// Executes requests with a keyed TTL cache in front of a resolver.
///
/// Cloning is cheap and clones share one cache. Separate executors built
/// from separate builders share nothing.
///
/// Concurrent calls for the same key are not merged: each one misses,
/// calls the resolver and writes the cache, and the last write wins.
pub struct RequestExecutor<R, Res, C = SystemClock>
where
    Res: Resolver<R>,
{
    shared: Arc<Shared<R, Res, C>>,
}

struct Shared<R, Res, C>
where
    Res: Resolver<R>,
{
    resolver: Res,
    /// Never held across an await
    store: Mutex<CacheStore<Output<R, Res>, C>>,
    hooks: CacheHooks,
    state: watch::Sender<ExecutorState<Failure<R, Res>>>,
    runtime: Option<Handle>,
    _request: PhantomData<fn(R)>,
}

impl<R, Res> RequestExecutor<R, Res, SystemClock>
where
    Res: Resolver<R>,
{
    // == Constructors ==
    /// Creates an executor with default TTL (5 minutes) and capacity (100).
    pub fn new(resolver: Res) -> Self {
        ExecutorBuilder::new(resolver).build()
    }

    /// Starts configuring an executor.
    pub fn builder(resolver: Res) -> ExecutorBuilder<R, Res, SystemClock> {
        ExecutorBuilder::new(resolver)
    }
}

impl<R, Res, C> RequestExecutor<R, Res, C>
where
    Res: Resolver<R>,
    C: Clock,
{
    pub(crate) fn from_parts(
        resolver: Res,
        config: &CacheConfig,
        hooks: CacheHooks,
        runtime: Option<Handle>,
        clock: C,
    ) -> Self {
        let (state, _) = watch::channel(ExecutorState::idle());

        Self {
            shared: Arc::new(Shared {
                resolver,
                store: Mutex::new(CacheStore::with_clock(config, clock)),
                hooks,
                state,
                runtime,
                _request: PhantomData,
            }),
        }
    }

    // == Clear Cache ==
    /// Removes every cached entry. Hit and miss counts are kept.
    pub fn clear_cache(&self) -> usize {
        let removed = self.shared.lock_store().clear();
        info!(removed, "cleared request cache");
        removed
    }

    /// Removes cached entries whose key satisfies `predicate`.
    pub fn clear_cache_matching<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&CacheKey) -> bool,
    {
        let removed = self.shared.lock_store().clear_matching(predicate);
        info!(removed, "cleared matching request cache entries");
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn get_cache_stats(&self) -> CacheStats {
        self.shared.lock_store().stats()
    }

    // == Observable State ==
    /// True while an eager call is waiting on the resolver.
    pub fn loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    /// The last eager failure, if no eager call has succeeded since.
    pub fn error(&self) -> Option<CacheError<Failure<R, Res>>> {
        self.shared.state.borrow().error.clone()
    }

    /// Current loading flag and error slot together.
    pub fn state(&self) -> ExecutorState<Failure<R, Res>> {
        self.shared.state.borrow().clone()
    }

    /// Watches the loading flag and error slot for changes.
    pub fn subscribe(&self) -> watch::Receiver<ExecutorState<Failure<R, Res>>> {
        self.shared.state.subscribe()
    }
}

impl<R, Res, C> RequestExecutor<R, Res, C>
where
    R: Serialize + Send + 'static,
    Res: Resolver<R>,
    C: Clock,
{
    // == Execute ==
    /// Describes a cached request without running it.
    ///
    /// Nothing happens until the returned future is polled. Dropping it
    /// before then leaves the cache and stats untouched; dropping it while
    /// the resolver is in flight drops the resolver's future too.
    pub fn execute(
        &self,
        request: R,
    ) -> impl Future<Output = Result<Output<R, Res>, Failure<R, Res>>> + Send + 'static {
        let shared = Arc::clone(&self.shared);
        async move { shared.fetch(request, || {}).await }
    }

    // == Execute Promise ==
    /// Starts a cached request now and tracks it in the observable state.
    ///
    /// The request is spawned on the configured runtime, or the current one.
    /// A miss sets `loading` before the resolver runs; a hit never does.
    /// On settling, `loading` is cleared and `error` is set or cleared. A task
    /// that panics or is cancelled first settles as `CacheError::Aborted`.
    pub fn execute_promise(&self, request: R) -> PendingRequest<Output<R, Res>, Failure<R, Res>> {
        let runtime = match self
            .shared
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        {
            Some(runtime) => runtime,
            None => {
                let err = CacheError::Uninitialized(
                    "no tokio runtime configured or running for execute_promise".to_string(),
                );
                self.shared.state.send_modify(|state| state.fail(err.clone()));
                return PendingRequest::failed(err);
            }
        };

        let shared = Arc::clone(&self.shared);
        let handle = runtime.spawn(async move {
            let state = &shared.state;
            let mut settle = SettleGuard::new(state);
            let result = shared
                .fetch(request, || state.send_modify(ExecutorState::begin))
                .await;
            settle.disarm();

            match &result {
                Ok(_) => {
                    state.send_if_modified(ExecutorState::succeed);
                }
                Err(err) => state.send_modify(|s| s.fail(err.clone())),
            }
            result
        });

        PendingRequest::spawned(handle)
    }
}

impl<R, Res, C> Shared<R, Res, C>
where
    R: Serialize + Send + 'static,
    Res: Resolver<R>,
    C: Clock,
{
    // == Fetch ==
    /// Compute-or-fetch routine behind both entry points.
    ///
    /// `on_dispatch` runs only on a miss, right before the resolver call.
    async fn fetch<F>(&self, request: R, on_dispatch: F) -> Result<Output<R, Res>, Failure<R, Res>>
    where
        F: FnOnce() + Send,
    {
        let key = CacheKey::derive(&request)
            .map_err(|err| CacheError::<Failure<R, Res>>::InvalidRequest(err.to_string()))?;

        let lookup = self.lock_store().lookup(&key);
        if let Lookup::Hit(value) = lookup {
            debug!(key = %key, "cache hit");
            self.hooks.hit(&key);
            return Ok(value);
        }

        debug!(key = %key, "cache miss, resolving");
        self.hooks.miss(&key);
        on_dispatch();

        let value = match self.resolver.resolve(request).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, "resolver failed, nothing cached");
                return Err(CacheError::Resolver(err));
            }
        };

        self.lock_store().insert(key, value.clone());
        Ok(value)
    }
}

impl<R, Res, C> Shared<R, Res, C>
where
    Res: Resolver<R>,
{
    fn lock_store(&self) -> MutexGuard<'_, CacheStore<Output<R, Res>, C>> {
        // Store operations cannot leave it half-updated, so a poisoned lock is still usable
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Settle Guard ==
/// Marks the observable state as aborted if an eager task ends without
/// settling, which happens when the resolver panics or the runtime drops the
/// task mid-flight.
struct SettleGuard<'a, E> {
    state: &'a watch::Sender<ExecutorState<E>>,
    armed: bool,
}

impl<'a, E> SettleGuard<'a, E> {
    fn new(state: &'a watch::Sender<ExecutorState<E>>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<E> Drop for SettleGuard<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            warn!("eager request ended before settling");
            self.state.send_modify(|s| {
                s.fail(CacheError::Aborted(
                    "request task panicked or was cancelled".to_string(),
                ))
            });
        }
    }
}

impl<R, Res, C> Clone for RequestExecutor<R, Res, C>
where
    Res: Resolver<R>,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}
