//! Cache metrics recording.

use metrics::{counter, gauge};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registers the cache metric descriptions.
/// Call once at startup.
pub fn register_cache_metrics() {
    metrics::describe_counter!("usher_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!("usher_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!(
        "usher_cache_flushes_total",
        "Total number of explicit cache flushes"
    );
    metrics::describe_gauge!("usher_cache_entries", "Current number of entries per cache");
}

/// Per-cache hit/miss recorder.
/// Uses internal atomic counters so hit rates are cheap to read.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    cache: &'static str,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CacheMetrics {
    /// Creates a recorder labelled with the cache name.
    pub fn new(cache: &'static str) -> Self {
        Self {
            cache,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a cache hit.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("usher_cache_hits_total", "cache" => self.cache).increment(1);
    }

    /// Records a cache miss.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("usher_cache_misses_total", "cache" => self.cache).increment(1);
    }

    /// Records an explicit flush, tagged with where it came from.
    pub fn record_flush(&self, origin: &'static str) {
        counter!("usher_cache_flushes_total", "cache" => self.cache, "origin" => origin)
            .increment(1);
    }

    /// Updates the entry-count gauge.
    pub fn update_entry_count(&self, count: u64) {
        gauge!("usher_cache_entries", "cache" => self.cache).set(count as f64);
    }

    /// Hit rate since process start (for logging/debugging).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    /// Number of hits recorded.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of misses recorded.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_when_untouched() {
        let m = CacheMetrics::new("settings");
        assert_eq!(m.hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_counts() {
        let m = CacheMetrics::new("settings");
        m.record_hit();
        m.record_hit();
        m.record_miss();
        assert_eq!(m.hits(), 2);
        assert_eq!(m.misses(), 1);
        assert!((m.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
