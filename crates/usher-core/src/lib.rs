//! Usher Core - Domain types and the settings codec
//!
//! This crate provides the foundational types for the Usher backend:
//! snowflake identifier newtypes, the closed settings-key enumerations with
//! their codec, invite tallying, ranks and moderation config entities.

pub mod error;
pub mod invites;
pub mod moderation;
pub mod rank;
pub mod settings;
pub mod types;

pub use error::{CoreError, Result};
pub use invites::{CodeUses, GeneratedReason, InviteCounts, LedgerEntry};
pub use moderation::{PunishmentConfig, PunishmentType, StrikeConfig, ViolationType};
pub use rank::{Rank, RankAssignmentStyle};
pub use settings::{
    GuildSettings, GuildSettingsKey, InviteCodeSettings, InviteCodeSettingsKey, MemberSettings,
    MemberSettingsKey, SettingKey, SettingType, SettingValue, SettingsView,
};
pub use types::{ChannelId, GuildId, MemberId, MessageId, RoleId, SNOWFLAKE_SEQUENCE_BITS};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }

    #[test]
    fn version_is_semver() {
        let v = version();
        assert_eq!(v.split('.').count(), 3, "Version should be semver");
    }
}
