//! Shared helpers for the cache integration tests.

use std::sync::Arc;

use usher_cache::{Caches, MemoryStore, NoopNotifier};

/// Builds a cache registry over a fresh in-memory store.
pub fn caches() -> (Caches, MemoryStore) {
    let store = MemoryStore::new();
    let caches = Caches::new(Arc::new(store.clone()), Arc::new(NoopNotifier));
    (caches, store)
}
