//! The domain caches and their registry.

mod guild_data;
mod settings;

pub use guild_data::{
    CommandPermissions, PermissionsCache, PremiumCache, PunishmentConfigCache, StrikeConfigCache,
};
pub use settings::{InviteCodeSettingsCache, MemberSettingsCache, SettingsCache};

use std::sync::Arc;

use tracing::{info, warn};

use usher_core::{GuildId, InviteCounts, MemberId};

use crate::error::CacheError;
use crate::keyed::FlushNotifier;
use crate::keys::{CacheName, CodeKey, MemberKey};
use crate::metrics::register_cache_metrics;
use crate::store::Store;

/// All domain caches of one shard process.
///
/// An owned, injectable component: no ambient singleton, lifetime tied to
/// the shard process, explicit [`init`](Caches::init) and
/// [`dispose`](Caches::dispose).
pub struct Caches {
    /// Guild settings.
    pub settings: SettingsCache,
    /// Per-member settings.
    pub member_settings: MemberSettingsCache,
    /// Per-invite-code settings.
    pub invite_codes: InviteCodeSettingsCache,
    /// Command permission overrides.
    pub permissions: PermissionsCache,
    /// Premium status.
    pub premium: PremiumCache,
    /// Punishment configs.
    pub punishments: PunishmentConfigCache,
    /// Strike configs.
    pub strikes: StrikeConfigCache,

    store: Arc<dyn Store>,
}

impl Caches {
    /// Wires every domain cache against the given store and notifier.
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            settings: SettingsCache::new(Arc::clone(&store), Arc::clone(&notifier)),
            member_settings: MemberSettingsCache::new(Arc::clone(&store), Arc::clone(&notifier)),
            invite_codes: InviteCodeSettingsCache::new(Arc::clone(&store), Arc::clone(&notifier)),
            permissions: PermissionsCache::new(Arc::clone(&store), Arc::clone(&notifier)),
            premium: PremiumCache::new(Arc::clone(&store), Arc::clone(&notifier)),
            punishments: PunishmentConfigCache::new(Arc::clone(&store), Arc::clone(&notifier)),
            strikes: StrikeConfigCache::new(Arc::clone(&store), notifier),
            store,
        }
    }

    /// Verifies the store is reachable and registers metric descriptions.
    pub async fn init(&self) -> Result<(), CacheError> {
        self.store.health_check().await?;
        register_cache_metrics();
        info!(store = self.store.name(), "domain caches initialized");
        Ok(())
    }

    /// Drops every cached entry. Called on shutdown.
    pub fn dispose(&self) {
        self.flush_all();
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Evicts one entry addressed by `(cache name, key string)`, the shape
    /// flush notices travel in.
    ///
    /// Returns false for an unknown cache name or a key that does not
    /// parse; such notices are logged and dropped, never fatal.
    pub async fn flush_named(&self, cache: &str, key: &str) -> bool {
        let Some(name) = CacheName::from_name(cache) else {
            warn!(cache = %cache, "flush notice for unknown cache");
            return false;
        };

        let flushed = match name {
            CacheName::Settings => match key.parse::<GuildId>() {
                Ok(guild) => {
                    self.settings.flush(guild).await;
                    true
                }
                Err(_) => false,
            },
            CacheName::MemberSettings => match key.parse::<MemberKey>() {
                Ok(k) => {
                    self.member_settings.flush(k.guild_id, k.member_id).await;
                    true
                }
                Err(()) => false,
            },
            CacheName::InviteCodeSettings => match key.parse::<CodeKey>() {
                Ok(k) => {
                    self.invite_codes.flush(k.guild_id, &k.code).await;
                    true
                }
                Err(()) => false,
            },
            CacheName::Permissions => match key.parse::<GuildId>() {
                Ok(guild) => {
                    self.permissions.flush(guild).await;
                    true
                }
                Err(_) => false,
            },
            CacheName::Premium => match key.parse::<GuildId>() {
                Ok(guild) => {
                    self.premium.flush(guild).await;
                    true
                }
                Err(_) => false,
            },
            CacheName::Punishments => match key.parse::<GuildId>() {
                Ok(guild) => {
                    self.punishments.flush(guild).await;
                    true
                }
                Err(_) => false,
            },
            CacheName::Strikes => match key.parse::<GuildId>() {
                Ok(guild) => {
                    self.strikes.flush(guild).await;
                    true
                }
                Err(_) => false,
            },
        };

        if !flushed {
            warn!(cache = %cache, key = %key, "flush notice key does not parse");
        }
        flushed
    }

    /// Evicts everything, in every cache.
    pub fn flush_all(&self) {
        self.settings.inner().flush_all();
        self.member_settings.inner().flush_all();
        self.invite_codes.inner().flush_all();
        self.permissions.inner().flush_all();
        self.premium.inner().flush_all();
        self.punishments.inner().flush_all();
        self.strikes.inner().flush_all();
    }

    /// Derives a member's invite totals from the store.
    ///
    /// Totals are derived, never cached: the underlying counters move on
    /// every join/leave and staleness here is user-visible.
    pub async fn invite_counts(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<InviteCounts, CacheError> {
        let codes = self.store.invite_code_uses(guild, member).await?;
        let ledger = self.store.invite_ledger(guild, member).await?;
        Ok(InviteCounts::tally(codes.iter(), ledger.iter()))
    }
}
