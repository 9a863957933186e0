//! The relational-store seam.
//!
//! This trait abstracts over the backing database so the caches can load
//! and persist without knowing the storage engine. Production wires a SQL
//! implementation; tests and single-process setups use [`MemoryStore`].

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use usher_core::{
    CodeUses, GuildId, LedgerEntry, MemberId, PunishmentConfig, Rank, RoleId, StrikeConfig,
};

/// Error accessing the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A query failed.
    #[error("store query failed: {message}")]
    Query {
        /// Description of what went wrong
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The store is not reachable.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the outage
        message: String,
    },
}

impl StoreError {
    /// Creates a `Query` error from a message.
    pub fn query(message: impl Into<String>) -> Self {
        StoreError::Query {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a `Query` error wrapping a cause.
    pub fn query_with(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Query {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates an `Unavailable` error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }
}

/// One stored settings row: key name and nullable encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRow {
    /// The database name of the key.
    pub key: String,
    /// The encoded value; `None` is the cleared state.
    pub value: Option<String>,
}

impl SettingsRow {
    /// Creates a row.
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A command permission override row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverride {
    /// The command the override applies to.
    pub command: String,
    /// A role allowed to run the command.
    pub role_id: RoleId,
}

/// The relational store behind the caches.
///
/// Loads return whatever rows exist; absence is meaningful (a missing
/// settings row decodes to the key's default) so none of these methods
/// invent defaults themselves.
#[async_trait]
pub trait Store: Send + Sync {
    /// Settings rows of a guild.
    async fn guild_settings(&self, guild: GuildId) -> Result<Vec<SettingsRow>, StoreError>;

    /// Writes one guild settings cell. `None` stores the cleared state.
    async fn write_guild_setting(
        &self,
        guild: GuildId,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError>;

    /// Settings rows of a member.
    async fn member_settings(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<SettingsRow>, StoreError>;

    /// Writes one member settings cell.
    async fn write_member_setting(
        &self,
        guild: GuildId,
        member: MemberId,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError>;

    /// Settings rows of an invite code.
    async fn invite_code_settings(
        &self,
        guild: GuildId,
        code: &str,
    ) -> Result<Vec<SettingsRow>, StoreError>;

    /// Writes one invite-code settings cell.
    async fn write_invite_code_setting(
        &self,
        guild: GuildId,
        code: &str,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError>;

    /// Command permission overrides of a guild.
    async fn permission_overrides(
        &self,
        guild: GuildId,
    ) -> Result<Vec<PermissionOverride>, StoreError>;

    /// Whether the guild has an active premium subscription.
    async fn is_premium(&self, guild: GuildId) -> Result<bool, StoreError>;

    /// Punishment configs of a guild.
    async fn punishment_configs(&self, guild: GuildId)
    -> Result<Vec<PunishmentConfig>, StoreError>;

    /// Strike configs of a guild.
    async fn strike_configs(&self, guild: GuildId) -> Result<Vec<StrikeConfig>, StoreError>;

    /// Rank definitions of a guild, in stored order.
    async fn ranks(&self, guild: GuildId) -> Result<Vec<Rank>, StoreError>;

    /// Use counters of the invite codes a member created in a guild.
    async fn invite_code_uses(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<CodeUses>, StoreError>;

    /// Custom-invite ledger rows of a member in a guild.
    async fn invite_ledger(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Verifies the store is reachable.
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// The name of this store backend, for logging.
    fn name(&self) -> &str;
}
