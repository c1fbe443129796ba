//! Error types for the request cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cached request execution.
///
/// `E` is the resolver's own error type. It is carried through unchanged in
/// [`CacheError::Resolver`]; the cache never wraps, retries or suppresses it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError<E> {
    /// The resolver failed for this request
    #[error("Resolver failed: {0}")]
    Resolver(E),

    /// The request could not be turned into a cache key
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No runtime was available to run the request on
    #[error("Not initialized: {0}")]
    Uninitialized(String),

    /// The task running the request panicked or was cancelled
    #[error("Request aborted: {0}")]
    Aborted(String),
}

impl<E> CacheError<E> {
    // == Resolver Error ==
    /// Returns the resolver's error if this failure came from the resolver.
    pub fn into_resolver_error(self) -> Option<E> {
        match self {
            CacheError::Resolver(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if the resolver produced this failure.
    pub fn is_resolver(&self) -> bool {
        matches!(self, CacheError::Resolver(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cached request execution.
pub type Result<T, E> = std::result::Result<T, CacheError<E>>;
