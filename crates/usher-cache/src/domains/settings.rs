//! Settings caches for the three key families.
//!
//! Each cache binds `KeyedCache` to one entity family: its key shape, its
//! loader query and the decode step through the settings codec. A loaded
//! view always covers every key (defaults fill the gaps), so callers never
//! deal with partial settings.

use std::sync::Arc;

use usher_core::settings::codec;
use usher_core::{
    GuildId, GuildSettings, GuildSettingsKey, InviteCodeSettings, InviteCodeSettingsKey,
    MemberId, MemberSettings, MemberSettingsKey, SettingKey, SettingValue, SettingsView,
};

use crate::error::CacheError;
use crate::keyed::{FlushNotifier, KeyedCache};
use crate::keys::{CacheName, CodeKey, MemberKey};
use crate::store::{SettingsRow, Store};

fn decode_rows<K>(rows: Vec<SettingsRow>) -> Result<SettingsView<K>, CacheError>
where
    K: SettingKey,
{
    SettingsView::from_rows(rows.iter().map(|r| (r.key.as_str(), r.value.as_deref())))
        .map_err(Into::into)
}

/// Guild settings cache, keyed by guild id.
pub struct SettingsCache {
    store: Arc<dyn Store>,
    cache: KeyedCache<GuildId, GuildSettings>,
}

impl SettingsCache {
    pub(crate) fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(CacheName::Settings, notifier),
        }
    }

    /// Returns the guild's settings, loading them on first access.
    pub async fn get(&self, guild: GuildId) -> Result<Arc<GuildSettings>, CacheError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_load(guild, || async move {
                decode_rows(store.guild_settings(guild).await?)
            })
            .await
    }

    /// Sets one settings key and returns the canonical stored value.
    ///
    /// Sentinels are resolved and the value validated before anything is
    /// written; on success the local entry is replaced with a canonical
    /// re-read and a flush notice goes out to the other shards.
    pub async fn set_one(
        &self,
        guild: GuildId,
        key: GuildSettingsKey,
        value: SettingValue,
    ) -> Result<SettingValue, CacheError> {
        let value = codec::resolve_sentinels(key, value);
        let raw = codec::encode(key, &value)?;

        let store = Arc::clone(&self.store);
        let view = self
            .cache
            .write_through(guild, || async move {
                store.write_guild_setting(guild, key.as_str(), raw).await?;
                decode_rows(store.guild_settings(guild).await?)
            })
            .await?;

        Ok(view.get(key).clone())
    }

    /// Evicts the guild's entry.
    pub async fn flush(&self, guild: GuildId) {
        self.cache.flush(&guild).await;
    }

    pub(crate) fn inner(&self) -> &KeyedCache<GuildId, GuildSettings> {
        &self.cache
    }
}

/// Member settings cache, keyed by `guild:member`.
pub struct MemberSettingsCache {
    store: Arc<dyn Store>,
    cache: KeyedCache<MemberKey, MemberSettings>,
}

impl MemberSettingsCache {
    pub(crate) fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(CacheName::MemberSettings, notifier),
        }
    }

    /// Returns the member's settings, loading them on first access.
    pub async fn get(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Arc<MemberSettings>, CacheError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_or_load(MemberKey::new(guild, member), || async move {
                decode_rows(store.member_settings(guild, member).await?)
            })
            .await
    }

    /// Sets one member settings key and returns the canonical stored value.
    pub async fn set_one(
        &self,
        guild: GuildId,
        member: MemberId,
        key: MemberSettingsKey,
        value: SettingValue,
    ) -> Result<SettingValue, CacheError> {
        let value = codec::resolve_sentinels(key, value);
        let raw = codec::encode(key, &value)?;

        let store = Arc::clone(&self.store);
        let view = self
            .cache
            .write_through(MemberKey::new(guild, member), || async move {
                store
                    .write_member_setting(guild, member, key.as_str(), raw)
                    .await?;
                decode_rows(store.member_settings(guild, member).await?)
            })
            .await?;

        Ok(view.get(key).clone())
    }

    /// Evicts the member's entry.
    pub async fn flush(&self, guild: GuildId, member: MemberId) {
        self.cache.flush(&MemberKey::new(guild, member)).await;
    }

    pub(crate) fn inner(&self) -> &KeyedCache<MemberKey, MemberSettings> {
        &self.cache
    }
}

/// Invite-code settings cache, keyed by `guild:code`.
pub struct InviteCodeSettingsCache {
    store: Arc<dyn Store>,
    cache: KeyedCache<CodeKey, InviteCodeSettings>,
}

impl InviteCodeSettingsCache {
    pub(crate) fn new(store: Arc<dyn Store>, notifier: Arc<dyn FlushNotifier>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(CacheName::InviteCodeSettings, notifier),
        }
    }

    /// Returns the code's settings, loading them on first access.
    pub async fn get(
        &self,
        guild: GuildId,
        code: &str,
    ) -> Result<Arc<InviteCodeSettings>, CacheError> {
        let store = Arc::clone(&self.store);
        let owned = code.to_string();
        self.cache
            .get_or_load(CodeKey::new(guild, code), || async move {
                decode_rows(store.invite_code_settings(guild, &owned).await?)
            })
            .await
    }

    /// Sets one invite-code settings key and returns the canonical value.
    pub async fn set_one(
        &self,
        guild: GuildId,
        code: &str,
        key: InviteCodeSettingsKey,
        value: SettingValue,
    ) -> Result<SettingValue, CacheError> {
        let value = codec::resolve_sentinels(key, value);
        let raw = codec::encode(key, &value)?;

        let store = Arc::clone(&self.store);
        let owned = code.to_string();
        let view = self
            .cache
            .write_through(CodeKey::new(guild, code), || async move {
                store
                    .write_invite_code_setting(guild, &owned, key.as_str(), raw)
                    .await?;
                decode_rows(store.invite_code_settings(guild, &owned).await?)
            })
            .await?;

        Ok(view.get(key).clone())
    }

    /// Evicts the code's entry.
    pub async fn flush(&self, guild: GuildId, code: &str) {
        self.cache.flush(&CodeKey::new(guild, code)).await;
    }

    pub(crate) fn inner(&self) -> &KeyedCache<CodeKey, InviteCodeSettings> {
        &self.cache
    }
}
