//! Resolver Capability
//!
//! The external computation the executor falls back to on a cache miss.

use std::future::Future;

// == Resolver ==
/// Produces the real result for one request.
///
/// The executor calls this once per miss and never retries, times out or
/// deduplicates calls. Batching, if wanted, belongs inside the resolver.
pub trait Resolver<R>: Send + Sync + 'static {
    /// The resolved value, cloned into the cache on success
    type Output: Clone + Send + Sync + 'static;
    /// The failure type, passed through to callers unchanged
    type Error: Clone + Send + Sync + 'static;

    /// Runs the request to a single outcome.
    fn resolve(
        &self,
        request: R,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

impl<R, F, Fut, V, E> Resolver<R> for F
where
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = V;
    type Error = E;

    fn resolve(&self, request: R) -> impl Future<Output = Result<V, E>> + Send {
        self(request)
    }
}
