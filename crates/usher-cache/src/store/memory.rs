//! In-memory store backend.
//!
//! A full `Store` implementation over hash maps. Used by the integration
//! tests and by single-process development setups; production replaces it
//! with a SQL-backed implementation of the same trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use usher_core::{
    CodeUses, GuildId, LedgerEntry, MemberId, PunishmentConfig, Rank, StrikeConfig,
};

use super::{PermissionOverride, SettingsRow, Store, StoreError};

#[derive(Default)]
struct Tables {
    guild_settings: HashMap<(GuildId, String), Option<String>>,
    member_settings: HashMap<(GuildId, MemberId, String), Option<String>>,
    invite_code_settings: HashMap<(GuildId, String, String), Option<String>>,
    permission_overrides: HashMap<GuildId, Vec<PermissionOverride>>,
    premium: HashMap<GuildId, bool>,
    punishment_configs: HashMap<GuildId, Vec<PunishmentConfig>>,
    strike_configs: HashMap<GuildId, Vec<StrikeConfig>>,
    ranks: HashMap<GuildId, Vec<Rank>>,
    invite_codes: HashMap<(GuildId, MemberId), Vec<CodeUses>>,
    invite_ledger: HashMap<(GuildId, MemberId), Vec<LedgerEntry>>,
}

/// Hash-map backed store, cheap to clone and share.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the premium flag of a guild.
    pub fn set_premium(&self, guild: GuildId, premium: bool) {
        self.tables.write().premium.insert(guild, premium);
    }

    /// Seeds the rank table of a guild.
    pub fn set_ranks(&self, guild: GuildId, ranks: Vec<Rank>) {
        self.tables.write().ranks.insert(guild, ranks);
    }

    /// Seeds permission overrides of a guild.
    pub fn set_permission_overrides(&self, guild: GuildId, overrides: Vec<PermissionOverride>) {
        self.tables
            .write()
            .permission_overrides
            .insert(guild, overrides);
    }

    /// Seeds punishment configs of a guild.
    pub fn set_punishment_configs(&self, guild: GuildId, configs: Vec<PunishmentConfig>) {
        self.tables
            .write()
            .punishment_configs
            .insert(guild, configs);
    }

    /// Seeds strike configs of a guild.
    pub fn set_strike_configs(&self, guild: GuildId, configs: Vec<StrikeConfig>) {
        self.tables.write().strike_configs.insert(guild, configs);
    }

    /// Seeds the invite-code use counters of a member.
    pub fn set_invite_code_uses(&self, guild: GuildId, member: MemberId, codes: Vec<CodeUses>) {
        self.tables
            .write()
            .invite_codes
            .insert((guild, member), codes);
    }

    /// Appends a custom-invite ledger row.
    pub fn push_ledger_entry(&self, guild: GuildId, member: MemberId, entry: LedgerEntry) {
        self.tables
            .write()
            .invite_ledger
            .entry((guild, member))
            .or_default()
            .push(entry);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn guild_settings(&self, guild: GuildId) -> Result<Vec<SettingsRow>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .guild_settings
            .iter()
            .filter(|((g, _), _)| *g == guild)
            .map(|((_, key), value)| SettingsRow::new(key.clone(), value.clone()))
            .collect())
    }

    async fn write_guild_setting(
        &self,
        guild: GuildId,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        self.tables
            .write()
            .guild_settings
            .insert((guild, key.to_string()), value);
        Ok(())
    }

    async fn member_settings(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<SettingsRow>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .member_settings
            .iter()
            .filter(|((g, m, _), _)| *g == guild && *m == member)
            .map(|((_, _, key), value)| SettingsRow::new(key.clone(), value.clone()))
            .collect())
    }

    async fn write_member_setting(
        &self,
        guild: GuildId,
        member: MemberId,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        self.tables
            .write()
            .member_settings
            .insert((guild, member, key.to_string()), value);
        Ok(())
    }

    async fn invite_code_settings(
        &self,
        guild: GuildId,
        code: &str,
    ) -> Result<Vec<SettingsRow>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .invite_code_settings
            .iter()
            .filter(|((g, c, _), _)| *g == guild && c == code)
            .map(|((_, _, key), value)| SettingsRow::new(key.clone(), value.clone()))
            .collect())
    }

    async fn write_invite_code_setting(
        &self,
        guild: GuildId,
        code: &str,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        self.tables
            .write()
            .invite_code_settings
            .insert((guild, code.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn permission_overrides(
        &self,
        guild: GuildId,
    ) -> Result<Vec<PermissionOverride>, StoreError> {
        Ok(self
            .tables
            .read()
            .permission_overrides
            .get(&guild)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_premium(&self, guild: GuildId) -> Result<bool, StoreError> {
        Ok(self.tables.read().premium.get(&guild).copied().unwrap_or(false))
    }

    async fn punishment_configs(
        &self,
        guild: GuildId,
    ) -> Result<Vec<PunishmentConfig>, StoreError> {
        Ok(self
            .tables
            .read()
            .punishment_configs
            .get(&guild)
            .cloned()
            .unwrap_or_default())
    }

    async fn strike_configs(&self, guild: GuildId) -> Result<Vec<StrikeConfig>, StoreError> {
        Ok(self
            .tables
            .read()
            .strike_configs
            .get(&guild)
            .cloned()
            .unwrap_or_default())
    }

    async fn ranks(&self, guild: GuildId) -> Result<Vec<Rank>, StoreError> {
        Ok(self.tables.read().ranks.get(&guild).cloned().unwrap_or_default())
    }

    async fn invite_code_uses(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<CodeUses>, StoreError> {
        Ok(self
            .tables
            .read()
            .invite_codes
            .get(&(guild, member))
            .cloned()
            .unwrap_or_default())
    }

    async fn invite_ledger(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .tables
            .read()
            .invite_ledger
            .get(&(guild, member))
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
