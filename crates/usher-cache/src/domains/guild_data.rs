//! Read-mostly per-guild caches: permissions, premium, moderation config.
//!
//! These entities are mutated through their own command surfaces which
//! write the store directly and then flush; the caches here only load and
//! evict.

use std::sync::Arc;

use indexmap::IndexMap;

use usher_core::{GuildId, PunishmentConfig, RoleId, StrikeConfig};

use crate::error::CacheError;
use crate::keyed::{FlushNotifier, KeyedCache};
use crate::keys::CacheName;
use crate::store::Store;

/// Decoded command permission overrides of one guild.
///
/// A command with no entry has no override and falls back to the caller's
/// own permission checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPermissions {
    by_command: IndexMap<String, Vec<RoleId>>,
}

impl CommandPermissions {
    /// Roles allowed to run `command`, empty if no override exists.
    pub fn roles_for(&self, command: &str) -> &[RoleId] {
        self.by_command
            .get(command)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any override is configured.
    pub fn is_empty(&self) -> bool {
        self.by_command.is_empty()
    }
}

/// Permission override cache, keyed by guild id.
pub struct PermissionsCache {
    store: Arc<dyn Store>,
    cache: KeyedCache<GuildId, CommandPermissions>,
}

impl PermissionsCache {
    pub(crate) fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(CacheName::Permissions, notifier),
        }
    }

    /// Returns the guild's permission overrides.
    pub async fn get(&self, guild: GuildId) -> Result<Arc<CommandPermissions>, CacheError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_load(guild, || async move {
                let rows = store.permission_overrides(guild).await?;
                let mut by_command: IndexMap<String, Vec<RoleId>> = IndexMap::new();
                for row in rows {
                    by_command.entry(row.command).or_default().push(row.role_id);
                }
                Ok(CommandPermissions { by_command })
            })
            .await
    }

    /// Evicts the guild's entry.
    pub async fn flush(&self, guild: GuildId) {
        self.cache.flush(&guild).await;
    }

    pub(crate) fn inner(&self) -> &KeyedCache<GuildId, CommandPermissions> {
        &self.cache
    }
}

/// Premium status cache, keyed by guild id.
pub struct PremiumCache {
    store: Arc<dyn Store>,
    cache: KeyedCache<GuildId, bool>,
}

impl PremiumCache {
    pub(crate) fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(CacheName::Premium, notifier),
        }
    }

    /// Whether the guild has an active premium subscription.
    pub async fn get(&self, guild: GuildId) -> Result<bool, CacheError> {
        let store = Arc::clone(&self.store);
        let value = self
            .cache
            .get_or_load(guild, || async move {
                Ok(store.is_premium(guild).await?)
            })
            .await?;
        Ok(*value)
    }

    /// Evicts the guild's entry.
    pub async fn flush(&self, guild: GuildId) {
        self.cache.flush(&guild).await;
    }

    pub(crate) fn inner(&self) -> &KeyedCache<GuildId, bool> {
        &self.cache
    }
}

/// Punishment config cache, keyed by guild id.
pub struct PunishmentConfigCache {
    store: Arc<dyn Store>,
    cache: KeyedCache<GuildId, Vec<PunishmentConfig>>,
}

impl PunishmentConfigCache {
    pub(crate) fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(CacheName::Punishments, notifier),
        }
    }

    /// Returns the guild's punishment configs.
    pub async fn get(&self, guild: GuildId) -> Result<Arc<Vec<PunishmentConfig>>, CacheError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_load(guild, || async move {
                Ok(store.punishment_configs(guild).await?)
            })
            .await
    }

    /// Evicts the guild's entry.
    pub async fn flush(&self, guild: GuildId) {
        self.cache.flush(&guild).await;
    }

    pub(crate) fn inner(&self) -> &KeyedCache<GuildId, Vec<PunishmentConfig>> {
        &self.cache
    }
}

/// Strike config cache, keyed by guild id.
pub struct StrikeConfigCache {
    store: Arc<dyn Store>,
    cache: KeyedCache<GuildId, Vec<StrikeConfig>>,
}

impl StrikeConfigCache {
    pub(crate) fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(CacheName::Strikes, notifier),
        }
    }

    /// Returns the guild's strike configs.
    pub async fn get(&self, guild: GuildId) -> Result<Arc<Vec<StrikeConfig>>, CacheError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_load(guild, || async move {
                Ok(store.strike_configs(guild).await?)
            })
            .await
    }

    /// Evicts the guild's entry.
    pub async fn flush(&self, guild: GuildId) {
        self.cache.flush(&guild).await;
    }

    pub(crate) fn inner(&self) -> &KeyedCache<GuildId, Vec<StrikeConfig>> {
        &self.cache
    }
}
