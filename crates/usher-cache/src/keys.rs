//! Composite cache keys and the cache-name registry.
//!
//! Flush notices travel across shards as `(cache name, key string)` pairs,
//! so every key shape must render to a string and parse back from one.
//! Composite keys join their parts with `:`.

use std::fmt;
use std::str::FromStr;

use usher_core::{GuildId, MemberId};

/// Names of the domain caches, used to address flush notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheName {
    /// Guild settings.
    Settings,
    /// Per-member settings.
    MemberSettings,
    /// Per-invite-code settings.
    InviteCodeSettings,
    /// Command permission overrides.
    Permissions,
    /// Premium status.
    Premium,
    /// Punishment configs.
    Punishments,
    /// Strike configs.
    Strikes,
}

impl CacheName {
    /// All cache names.
    pub const ALL: [CacheName; 7] = [
        CacheName::Settings,
        CacheName::MemberSettings,
        CacheName::InviteCodeSettings,
        CacheName::Permissions,
        CacheName::Premium,
        CacheName::Punishments,
        CacheName::Strikes,
    ];

    /// The wire spelling of the cache name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheName::Settings => "settings",
            CacheName::MemberSettings => "memberSettings",
            CacheName::InviteCodeSettings => "inviteCodeSettings",
            CacheName::Permissions => "permissions",
            CacheName::Premium => "premium",
            CacheName::Punishments => "punishments",
            CacheName::Strikes => "strikes",
        }
    }

    /// Looks a cache up by its wire spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        CacheName::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a per-member cache entry: `guild:member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKey {
    /// The guild.
    pub guild_id: GuildId,
    /// The member.
    pub member_id: MemberId,
}

impl MemberKey {
    /// Creates a member key.
    pub fn new(guild_id: GuildId, member_id: MemberId) -> Self {
        Self { guild_id, member_id }
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.guild_id, self.member_id)
    }
}

impl FromStr for MemberKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (guild, member) = s.split_once(':').ok_or(())?;
        Ok(Self {
            guild_id: guild.parse().map_err(|_| ())?,
            member_id: member.parse().map_err(|_| ())?,
        })
    }
}

/// Key of a per-invite-code cache entry: `guild:code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeKey {
    /// The guild.
    pub guild_id: GuildId,
    /// The invite code.
    pub code: String,
}

impl CodeKey {
    /// Creates a code key.
    pub fn new(guild_id: GuildId, code: impl Into<String>) -> Self {
        Self {
            guild_id,
            code: code.into(),
        }
    }
}

impl fmt::Display for CodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.guild_id, self.code)
    }
}

impl FromStr for CodeKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (guild, code) = s.split_once(':').ok_or(())?;
        if code.is_empty() {
            return Err(());
        }
        Ok(Self {
            guild_id: guild.parse().map_err(|_| ())?,
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_name_round_trips() {
        for name in CacheName::ALL {
            assert_eq!(CacheName::from_name(name.as_str()), Some(name));
        }
        assert_eq!(CacheName::from_name("bogus"), None);
    }

    #[test]
    fn member_key_round_trips() {
        let key = MemberKey::new(GuildId::new(10), MemberId::new(20));
        assert_eq!(key.to_string(), "10:20");
        assert_eq!("10:20".parse::<MemberKey>().unwrap(), key);
    }

    #[test]
    fn code_key_round_trips() {
        let key = CodeKey::new(GuildId::new(10), "aBcD123");
        assert_eq!(key.to_string(), "10:aBcD123");
        assert_eq!("10:aBcD123".parse::<CodeKey>().unwrap(), key);
    }

    #[test]
    fn malformed_keys_do_not_parse() {
        assert!("justoneid".parse::<MemberKey>().is_err());
        assert!("x:y".parse::<MemberKey>().is_err());
        assert!("10:".parse::<CodeKey>().is_err());
    }
}
