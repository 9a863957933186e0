//! Punishment and strike configuration entities.

use serde::{Deserialize, Serialize};

use crate::types::GuildId;

/// The punishment applied when a strike threshold is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PunishmentType {
    Ban,
    Kick,
    Softban,
    Warn,
    Mute,
}

/// An automod violation category that earns strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationType {
    Invites,
    Links,
    Words,
    AllCaps,
    DuplicateText,
    QuickMessages,
    MentionUsers,
    MentionRoles,
    Emojis,
    Hoist,
}

/// Maps a strike total to a punishment for one guild.
///
/// At most one config exists per `(guild, punishment type)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunishmentConfig {
    /// The guild the config belongs to.
    pub guild_id: GuildId,
    /// The punishment to apply.
    pub punishment_type: PunishmentType,
    /// The strike total that triggers the punishment.
    pub amount: i64,
    /// Extra arguments for the punishment (e.g. mute duration), raw.
    pub args: String,
}

/// Maps a violation category to a strike amount for one guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeConfig {
    /// The guild the config belongs to.
    pub guild_id: GuildId,
    /// The violation earning the strikes.
    pub violation: ViolationType,
    /// Strikes earned per violation.
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punishment_type_serializes_lowercase() {
        let json = serde_json::to_string(&PunishmentType::Softban).unwrap();
        assert_eq!(json, "\"softban\"");
    }

    #[test]
    fn violation_type_serializes_camel_case() {
        let json = serde_json::to_string(&ViolationType::QuickMessages).unwrap();
        assert_eq!(json, "\"quickMessages\"");
    }
}
