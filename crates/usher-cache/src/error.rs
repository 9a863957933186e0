//! Error types for the cache layer.

use thiserror::Error;
use usher_core::CoreError;

use crate::store::StoreError;

/// Error of the cache system.
///
/// Store and validation failures propagate to the caller unmodified; the
/// cache itself never swallows them and never caches a failed load.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store failed while loading or persisting.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A settings value failed validation or decoding.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A shared in-flight load failed, surfaced to every waiter.
    ///
    /// moka hands every caller of a deduplicated load the original error
    /// behind an `Arc`; keeping the `Arc` keeps the typed variant
    /// inspectable instead of flattening it to a message.
    #[error(transparent)]
    Shared(#[from] std::sync::Arc<CacheError>),
}

impl CacheError {
    /// Returns true if the error is a settings validation failure.
    pub fn is_validation(&self) -> bool {
        match self {
            CacheError::Core(e) => e.is_validation(),
            CacheError::Shared(e) => e.is_validation(),
            _ => false,
        }
    }
}
