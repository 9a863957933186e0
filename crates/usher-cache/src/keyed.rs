//! Generic keyed cache with load deduplication and explicit eviction.
//!
//! `KeyedCache` is the building block of every domain cache: a per-key
//! memoizing map over an async loader. Entries are immutable `Arc` values
//! replaced wholesale on writes, so concurrent readers never observe a
//! partially updated value. There is no TTL by default; eviction is
//! explicit and driven by cross-shard flush notices.

use moka::future::Cache;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CacheError;
use crate::keys::CacheName;
use crate::metrics::CacheMetrics;

/// Receives flush events for local mutations.
///
/// The cache layer does not know about the broker; the invalidation bus
/// implements this seam and fans the notice out to the other shards. The
/// notice carries identity only, never the written value.
#[async_trait]
pub trait FlushNotifier: Send + Sync {
    /// Called after a local write-through replaced an entry.
    async fn publish_flush(&self, cache: CacheName, key: String);
}

/// A notifier that drops every notice. For single-shard setups and tests.
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl FlushNotifier for NoopNotifier {
    async fn publish_flush(&self, _cache: CacheName, _key: String) {}
}

/// Cache tuning knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (default: 100000).
    pub max_capacity: u64,
    /// Time-to-idle in seconds (optional; off by default, eviction is
    /// invalidation-driven).
    pub tti_seconds: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 100_000,
            tti_seconds: None,
        }
    }
}

/// An async, per-key memoizing cache with shared in-flight loads.
pub struct KeyedCache<K, V> {
    name: CacheName,
    inner: Cache<K, Arc<V>>,
    metrics: CacheMetrics,
    notifier: Arc<dyn FlushNotifier>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Display + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a cache with default tuning.
    pub fn new(name: CacheName, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self::with_config(name, notifier, CacheConfig::default())
    }

    /// Creates a cache with the given tuning.
    pub fn with_config(
        name: CacheName,
        notifier: Arc<dyn FlushNotifier>,
        config: CacheConfig,
    ) -> Self {
        let metrics = CacheMetrics::new(name.as_str());

        let mut builder = Cache::builder().max_capacity(config.max_capacity);
        if let Some(tti) = config.tti_seconds {
            builder = builder.time_to_idle(Duration::from_secs(tti));
        }

        let eviction_metrics = metrics.clone();
        builder = builder.eviction_listener(move |_key, _value, cause| {
            let reason = match cause {
                moka::notification::RemovalCause::Expired => "ttl",
                moka::notification::RemovalCause::Size => "capacity",
                moka::notification::RemovalCause::Explicit => "manual",
                moka::notification::RemovalCause::Replaced => "replaced",
            };
            eviction_metrics.record_flush(reason);
        });

        Self {
            name,
            inner: builder.build(),
            metrics,
            notifier,
        }
    }

    /// The name this cache is addressed by in flush notices.
    pub fn name(&self) -> CacheName {
        self.name
    }

    /// Returns the cached entry, loading it through `init` on a miss.
    ///
    /// Concurrent callers for the same cold key share one in-flight load:
    /// `init` runs exactly once and every waiter gets the same entry. A
    /// failed load is propagated to all waiters and leaves no entry behind
    /// (no negative caching); the next call retries.
    pub async fn get_or_load<F, Fut>(&self, key: K, init: F) -> Result<Arc<V>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CacheError>>,
    {
        if let Some(cached) = self.inner.get(&key).await {
            self.metrics.record_hit();
            return Ok(cached);
        }

        self.metrics.record_miss();

        let value = self
            .inner
            .try_get_with(key, async { init().await.map(Arc::new) })
            .await
            .map_err(CacheError::Shared)?;

        self.metrics.update_entry_count(self.inner.entry_count());

        Ok(value)
    }

    /// Writes through the backing store and replaces the local entry.
    ///
    /// `persist` must write the store and return the store's canonical
    /// re-read of the value; the caller's input is never trusted verbatim
    /// since persistence may normalize it. After the entry is replaced a
    /// flush notice is published for the other shards. On a persist error
    /// nothing changes locally and the error propagates.
    pub async fn write_through<F, Fut>(&self, key: K, persist: F) -> Result<Arc<V>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CacheError>>,
    {
        let canonical = Arc::new(persist().await?);
        self.inner.insert(key.clone(), Arc::clone(&canonical)).await;
        self.metrics.update_entry_count(self.inner.entry_count());

        self.notifier
            .publish_flush(self.name, key.to_string())
            .await;

        Ok(canonical)
    }

    /// Evicts the entry unconditionally; the next `get_or_load` reloads.
    /// Flushing an absent key is a no-op.
    pub async fn flush(&self, key: &K) {
        debug!(cache = %self.name, key = %key, "cache entry flushed");
        self.inner.invalidate(key).await;
    }

    /// Evicts every entry.
    pub fn flush_all(&self) {
        debug!(cache = %self.name, "cache flushed");
        self.inner.invalidate_all();
    }

    /// Approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// The hit/miss recorder.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Forces pending housekeeping. Tests only need this to make
    /// `entry_count` exact.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}
