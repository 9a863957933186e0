//! Gateway-side guild state the engine plans against.
//!
//! The engine never talks to the chat gateway to read state; the caller
//! hands it a snapshot of the guild's roles and the bot's own standing, and
//! gets a plan back. That keeps the planning step pure and testable.

use usher_core::{GuildId, RoleId};

/// Guild-level permission bits, in the chat platform's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_GUILD: Permissions = Permissions(1 << 5);
    pub const MANAGE_ROLES: Permissions = Permissions(1 << 28);

    pub const fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Permissions) -> Permissions {
        Permissions(self.0 | other.0)
    }

    /// A role that grants guild-wide control must never be handed out by
    /// an automated promotion.
    pub const fn is_dangerous(self) -> bool {
        self.contains(Self::ADMINISTRATOR) || self.contains(Self::MANAGE_GUILD)
    }
}

/// One role as it exists on the guild right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRole {
    pub id: RoleId,
    pub name: String,
    /// Position in the role hierarchy; higher is more powerful.
    pub position: i64,
    pub permissions: Permissions,
}

impl GuildRole {
    pub fn new(id: RoleId, name: impl Into<String>, position: i64, permissions: Permissions) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            permissions,
        }
    }
}

/// The bot's own membership in the guild.
#[derive(Debug, Clone, Default)]
pub struct BotMember {
    /// Roles the bot holds, bounding what it can assign.
    pub role_ids: Vec<RoleId>,
    /// The bot's computed guild permissions.
    pub permissions: Permissions,
}

/// Everything the planner needs to know about a guild.
#[derive(Debug, Clone)]
pub struct GuildSnapshot {
    pub guild_id: GuildId,
    pub roles: Vec<GuildRole>,
    pub bot: BotMember,
}

impl GuildSnapshot {
    pub fn role(&self, id: RoleId) -> Option<&GuildRole> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Position of the bot's highest role. Roles at or above this cannot
    /// be assigned or removed by the bot.
    pub fn bot_ceiling(&self) -> i64 {
        self.bot
            .role_ids
            .iter()
            .filter_map(|id| self.role(*id))
            .map(|r| r.position)
            .max()
            .unwrap_or(0)
    }
}
