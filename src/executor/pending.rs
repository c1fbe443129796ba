//! Pending Request
//!
//! Handle to an eagerly started request.

use std::future::{self, Future, Ready};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::{CacheError, Result};

// == Pending Request ==
/// An eagerly started request, awaited like a promise.
///
/// The work runs on its own task whether or not this handle is polled.
/// Dropping the handle does not cancel it, so its result may still be cached.
#[must_use = "the request runs regardless, but its outcome is only seen by awaiting"]
#[derive(Debug)]
pub struct PendingRequest<V, E> {
    inner: Inner<V, E>,
}

#[derive(Debug)]
enum Inner<V, E> {
    Spawned(JoinHandle<Result<V, E>>),
    Settled(Ready<Result<V, E>>),
}

impl<V, E> PendingRequest<V, E> {
    pub(crate) fn spawned(handle: JoinHandle<Result<V, E>>) -> Self {
        Self {
            inner: Inner::Spawned(handle),
        }
    }

    /// A request that failed before it could be started.
    pub(crate) fn failed(error: CacheError<E>) -> Self {
        Self {
            inner: Inner::Settled(future::ready(Err(error))),
        }
    }

    /// Returns true once the outcome is available without waiting.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Spawned(handle) => handle.is_finished(),
            Inner::Settled(_) => true,
        }
    }
}

impl<V, E> Future for PendingRequest<V, E> {
    type Output = Result<V, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Spawned(handle) => Pin::new(handle).poll(cx).map(|joined| {
                joined.unwrap_or_else(|err| Err(CacheError::Aborted(err.to_string())))
            }),
            Inner::Settled(ready) => Pin::new(ready).poll(cx),
        }
    }
}
