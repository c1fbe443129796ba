//! Integration Tests for the Request Executor
//!
//! Exercises the public API end to end: caching, expiry, eviction,
//! clearing, stats, the lazy and eager entry points, and observable state.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use request_cache::{CacheError, CacheKey, ExecutorState, ManualClock, RequestExecutor, Resolver};
use serde::Serialize;
use tokio::sync::Notify;
use tokio_test::{assert_pending, assert_ready_ok, task};

// == Helper Types ==

#[derive(Debug, Clone, Serialize)]
struct GetUser {
    id: String,
}

fn get_user(id: &str) -> GetUser {
    GetUser { id: id.to_string() }
}

/// Resolves `GetUser` to "user-<id>". Id "missing" fails.
///
/// With a gate set, every call waits for one `notify_one` before answering.
#[derive(Clone, Default)]
struct Users {
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl Users {
    fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let users = Self {
            calls: Arc::default(),
            gate: Some(Arc::clone(&gate)),
        };
        (users, gate)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolver<GetUser> for Users {
    type Output = String;
    type Error = String;

    async fn resolve(&self, request: GetUser) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if request.id == "missing" {
            Err(format!("no user {}", request.id))
        } else {
            Ok(format!("user-{}", request.id))
        }
    }
}

type Executor = RequestExecutor<GetUser, Users, ManualClock>;

fn create_executor(users: &Users, clock: &ManualClock) -> Executor {
    RequestExecutor::builder(users.clone())
        .clock(clock.clone())
        .build()
}

fn key_for(id: &str) -> CacheKey {
    CacheKey::derive(&get_user(id)).unwrap()
}

// == Hit and Miss ==

#[tokio::test]
async fn test_repeat_request_is_served_from_cache() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    let first = executor.execute(get_user("1")).await.unwrap();
    let second = executor.execute(get_user("1")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(users.calls(), 1);
}

#[tokio::test]
async fn test_miss_then_hit_accounting() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    executor.execute(get_user("1")).await.unwrap();
    let stats = executor.get_cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 0);

    executor.execute(get_user("1")).await.unwrap();
    let stats = executor.get_cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_hooks_fire_once_per_event() {
    let users = Users::default();
    let clock = ManualClock::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let (on_hit, on_miss) = (Arc::clone(&events), Arc::clone(&events));

    let executor: Executor = RequestExecutor::builder(users.clone())
        .ttl(Duration::from_secs(1))
        .clock(clock.clone())
        .on_cache_hit(move |key| on_hit.lock().unwrap().push(("hit", key.clone())))
        .on_cache_miss(move |key| on_miss.lock().unwrap().push(("miss", key.clone())))
        .build();

    executor.execute(get_user("1")).await.unwrap();
    executor.execute(get_user("1")).await.unwrap();
    clock.advance(Duration::from_millis(1_001));
    executor.execute(get_user("1")).await.unwrap();

    let key = key_for("1");
    assert_eq!(
        *events.lock().unwrap(),
        vec![("miss", key.clone()), ("hit", key.clone()), ("miss", key)]
    );
}

// == TTL Expiry ==

#[tokio::test]
async fn test_ttl_boundary() {
    let users = Users::default();
    let clock = ManualClock::new();
    let executor: Executor = RequestExecutor::builder(users.clone())
        .ttl(Duration::from_millis(1_000))
        .clock(clock.clone())
        .build();

    executor.execute(get_user("1")).await.unwrap();

    clock.set(999);
    executor.execute(get_user("1")).await.unwrap();
    assert_eq!(users.calls(), 1, "T - ε should be a hit");

    clock.set(1_001);
    executor.execute(get_user("1")).await.unwrap();
    assert_eq!(users.calls(), 2, "T + ε should be a miss");
}

#[tokio::test]
async fn test_default_ttl_scenario() {
    let users = Users::default();
    let clock = ManualClock::new();
    let executor = create_executor(&users, &clock);

    // t = 0: miss
    executor.execute(get_user("1")).await.unwrap();
    assert_eq!(users.calls(), 1);

    // t = 4 min: hit
    clock.set(4 * 60 * 1_000);
    executor.execute(get_user("1")).await.unwrap();
    assert_eq!(users.calls(), 1);

    // t = 6 min: expired, miss
    clock.set(6 * 60 * 1_000);
    executor.execute(get_user("1")).await.unwrap();
    assert_eq!(users.calls(), 2);

    let stats = executor.get_cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 2, 1));
}

// == Capacity Eviction ==

#[tokio::test]
async fn test_capacity_eviction_scenario() {
    let users = Users::default();
    let clock = ManualClock::new();
    let executor: Executor = RequestExecutor::builder(users.clone())
        .capacity(3)
        .clock(clock.clone())
        .build();

    for id in ["1", "2", "3"] {
        executor.execute(get_user(id)).await.unwrap();
        clock.advance(Duration::from_millis(1));
    }
    assert_eq!(executor.get_cache_stats().size, 3);

    // "4" evicts "1", the oldest
    executor.execute(get_user("4")).await.unwrap();
    assert_eq!(executor.get_cache_stats().size, 3);
    assert_eq!(users.calls(), 4);

    // "2" survived
    executor.execute(get_user("2")).await.unwrap();
    assert_eq!(users.calls(), 4);

    // "1" was evicted, so the resolver runs again
    executor.execute(get_user("1")).await.unwrap();
    assert_eq!(users.calls(), 5);

    let stats = executor.get_cache_stats();
    assert_eq!(stats.size, 3);
    assert_eq!(stats.evictions, 2);
}

// == Clearing ==

#[tokio::test]
async fn test_selective_clear() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    for id in ["1", "2", "3"] {
        executor.execute(get_user(id)).await.unwrap();
    }

    let removed = executor.clear_cache_matching(|key| key == &key_for("2"));
    assert_eq!(removed, 1);
    assert_eq!(executor.get_cache_stats().size, 2);

    executor.execute(get_user("2")).await.unwrap();
    assert_eq!(users.calls(), 4, "cleared key should miss");

    executor.execute(get_user("3")).await.unwrap();
    assert_eq!(users.calls(), 4, "retained key should hit");
}

#[tokio::test]
async fn test_full_clear_keeps_counters() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    executor.execute(get_user("1")).await.unwrap();
    executor.execute(get_user("1")).await.unwrap();
    executor.clear_cache();

    let stats = executor.get_cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 0));
}

// == Stats Snapshots ==

#[tokio::test]
async fn test_stats_snapshots_are_independent() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());
    executor.execute(get_user("1")).await.unwrap();

    let first = executor.get_cache_stats();
    let mut second = executor.get_cache_stats();
    assert_eq!(first, second);

    second.hits = 100;
    second.size = 0;
    assert_eq!(executor.get_cache_stats(), first);
}

// == Lazy Execution ==

#[test]
fn test_execute_is_lazy() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    let unpolled = executor.execute(get_user("1"));
    drop(unpolled);

    assert_eq!(users.calls(), 0);
    assert_eq!(executor.get_cache_stats().misses, 0);

    let mut run = task::spawn(executor.execute(get_user("1")));
    let value = assert_ready_ok!(run.poll());
    assert_eq!(value, "user-1");
    assert_eq!(users.calls(), 1);
}

#[test]
fn test_abandoned_in_flight_request_is_not_cached() {
    let (users, gate) = Users::gated();
    let executor = create_executor(&users, &ManualClock::new());

    let mut run = task::spawn(executor.execute(get_user("1")));
    assert_pending!(run.poll());
    assert_eq!(users.calls(), 1);
    assert_eq!(executor.get_cache_stats().misses, 1);

    drop(run);
    gate.notify_one();

    assert_eq!(executor.get_cache_stats().size, 0);
}

// == Resolver Failures ==

#[tokio::test]
async fn test_resolver_error_passes_through_unchanged() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    let err = executor.execute(get_user("missing")).await.unwrap_err();

    assert_eq!(err.into_resolver_error(), Some("no user missing".to_string()));
    assert_eq!(executor.get_cache_stats().size, 0);
}

#[tokio::test]
async fn test_unkeyable_request_is_rejected_before_lookup() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let executor: RequestExecutor<BTreeMap<(u32, u32), String>, _, ManualClock> =
        RequestExecutor::builder(move |cells: BTreeMap<(u32, u32), String>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, String>(cells.len()) }
        })
        .clock(ManualClock::new())
        .build();

    let cells = BTreeMap::from([((0, 0), "origin".to_string())]);
    let err = executor.execute(cells).await.unwrap_err();

    assert!(matches!(err, CacheError::InvalidRequest(_)));
    let stats = executor.get_cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (0, 0, 0));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// == Eager Execution and Observable State ==

#[tokio::test]
async fn test_execute_promise_loading_lifecycle() {
    let (users, gate) = Users::gated();
    let executor = create_executor(&users, &ManualClock::new());
    let mut state = executor.subscribe();

    assert!(!executor.loading());
    let pending = executor.execute_promise(get_user("1"));

    state.wait_for(|s| s.loading).await.unwrap();
    assert!(executor.error().is_none());

    gate.notify_one();
    assert_eq!(pending.await.unwrap(), "user-1");
    assert!(!executor.loading());
    assert!(executor.error().is_none());
}

#[tokio::test]
async fn test_execute_promise_failure_then_recovery() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    let err = executor.execute_promise(get_user("missing")).await.unwrap_err();
    assert_eq!(err, CacheError::Resolver("no user missing".to_string()));
    assert!(!executor.loading());
    assert_eq!(
        executor.state(),
        ExecutorState {
            loading: false,
            error: Some(err.clone()),
        }
    );
    assert_eq!(executor.error(), Some(err));

    executor.execute_promise(get_user("1")).await.unwrap();
    assert_eq!(executor.state(), ExecutorState::idle());
}

#[tokio::test]
async fn test_panicking_resolver_settles_as_aborted() {
    let executor: RequestExecutor<u32, _, ManualClock> =
        RequestExecutor::builder(|id: u32| async move {
            if id == 0 {
                panic!("resolver crashed on id 0");
            }
            Ok::<u32, String>(id)
        })
        .clock(ManualClock::new())
        .build();

    let result = executor.execute_promise(0).await;

    assert!(matches!(result, Err(CacheError::Aborted(_))));
    assert!(!executor.loading());
    assert!(matches!(executor.error(), Some(CacheError::Aborted(_))));
    assert_eq!(executor.get_cache_stats().size, 0);

    // The executor stays usable afterwards
    assert_eq!(executor.execute_promise(7).await.unwrap(), 7);
    assert_eq!(executor.state(), ExecutorState::idle());
}

#[tokio::test]
async fn test_cache_hit_does_not_enter_loading() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());
    executor.execute_promise(get_user("1")).await.unwrap();

    let mut state = executor.subscribe();
    state.mark_unchanged();

    executor.execute_promise(get_user("1")).await.unwrap();

    assert!(!state.has_changed().unwrap());
    assert!(!executor.loading());
    assert_eq!(users.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_identical_requests_are_not_merged() {
    let (users, gate) = Users::gated();
    let executor = create_executor(&users, &ManualClock::new());

    let first = executor.execute_promise(get_user("1"));
    let second = executor.execute_promise(get_user("1"));

    while users.calls() < 2 {
        tokio::task::yield_now().await;
    }
    gate.notify_one();
    gate.notify_one();

    assert_eq!(first.await.unwrap(), "user-1");
    assert_eq!(second.await.unwrap(), "user-1");

    let stats = executor.get_cache_stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.size, 1);
}

#[test]
fn test_execute_promise_uses_configured_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let users = Users::default();
    let executor: Executor = RequestExecutor::builder(users.clone())
        .runtime(runtime.handle().clone())
        .clock(ManualClock::new())
        .build();

    // Called from outside any runtime
    let pending = executor.execute_promise(get_user("1"));

    assert_eq!(runtime.block_on(pending).unwrap(), "user-1");
    assert_eq!(users.calls(), 1);
}

#[test]
fn test_runtime_shutdown_mid_request_settles_as_aborted() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let (users, _gate) = Users::gated();
    let executor: Executor = RequestExecutor::builder(users.clone())
        .runtime(runtime.handle().clone())
        .clock(ManualClock::new())
        .build();
    let mut state = executor.subscribe();

    let pending = executor.execute_promise(get_user("1"));
    runtime.block_on(async {
        state.wait_for(|s| s.loading).await.unwrap();
    });
    assert_eq!(users.calls(), 1);

    drop(runtime);

    assert!(!executor.loading());
    assert!(matches!(executor.error(), Some(CacheError::Aborted(_))));
    let result = tokio_test::block_on(pending);
    assert!(matches!(result, Err(CacheError::Aborted(_))));
    assert_eq!(executor.get_cache_stats().size, 0);
}

#[test]
fn test_execute_promise_without_runtime_fails_fast() {
    let users = Users::default();
    let executor = create_executor(&users, &ManualClock::new());

    let result = tokio_test::block_on(executor.execute_promise(get_user("1")));

    assert!(matches!(result, Err(CacheError::Uninitialized(_))));
    assert_eq!(users.calls(), 0);
}
