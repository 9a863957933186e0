//! Usher Cache - Keyed settings caches over the relational store
//!
//! Each shard process owns one [`Caches`] instance: a set of per-entity
//! memoizing caches with load deduplication, write-through settings
//! mutation and explicit eviction. Cross-shard consistency is handled by
//! the relay crate, which feeds foreign flush notices into
//! [`Caches::flush_named`] and fans local writes out through the
//! [`FlushNotifier`] seam.

pub mod domains;
pub mod error;
pub mod keyed;
pub mod keys;
pub mod metrics;
pub mod store;

pub use domains::{
    Caches, CommandPermissions, InviteCodeSettingsCache, MemberSettingsCache, PermissionsCache,
    PremiumCache, PunishmentConfigCache, SettingsCache, StrikeConfigCache,
};
pub use error::CacheError;
pub use keyed::{CacheConfig, FlushNotifier, KeyedCache, NoopNotifier};
pub use keys::{CacheName, CodeKey, MemberKey};
pub use self::metrics::{CacheMetrics, register_cache_metrics};
pub use store::{MemoryStore, PermissionOverride, SettingsRow, Store, StoreError};
