//! Executor State
//!
//! The loading flag and error slot shared by every eager call on one executor.

use crate::error::CacheError;

// == Executor State ==
/// Observable state of an executor's eager calls.
///
/// One slot per executor, not per request: with several calls in flight the
/// last one to settle decides what is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorState<E> {
    /// True while a resolver call started by an eager request is in flight
    pub loading: bool,
    /// The last failure, cleared by the next success
    pub error: Option<CacheError<E>>,
}

impl<E> ExecutorState<E> {
    /// Idle: not loading, no error.
    pub fn idle() -> Self {
        Self {
            loading: false,
            error: None,
        }
    }

    /// A resolver call is about to be dispatched.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// A call completed with a value, from the cache or the resolver.
    ///
    /// Returns true if this changed anything.
    pub fn succeed(&mut self) -> bool {
        let changed = self.loading || self.error.is_some();
        self.loading = false;
        self.error = None;
        changed
    }

    /// A call failed.
    pub fn fail(&mut self, error: CacheError<E>) {
        self.loading = false;
        self.error = Some(error);
    }
}

impl<E> Default for ExecutorState<E> {
    fn default() -> Self {
        Self::idle()
    }
}
