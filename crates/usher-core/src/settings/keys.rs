//! Closed settings-key enumerations.
//!
//! There are three key families, one per entity the settings tables are
//! scoped to: the guild itself, a member of a guild, and an invite code of
//! a guild. Each key carries static metadata: its declared type, its
//! default, and whether the stored value may be cleared. The metadata is
//! an exhaustive match per family, so a new key cannot be added without
//! deciding all three.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::settings::value::{SettingType, SettingValue};

/// Common interface over the three key families.
///
/// The codec and the domain caches are generic over this trait: key shape
/// and metadata differ per family, encode/decode does not.
pub trait SettingKey:
    Copy + Eq + std::hash::Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// All keys of the family, in definition order.
    fn all() -> &'static [Self];

    /// The database name of the key.
    fn as_str(&self) -> &'static str;

    /// Looks a key up by its database name.
    fn from_name(name: &str) -> Result<Self, CoreError>;

    /// The declared value type of the key.
    fn setting_type(&self) -> SettingType;

    /// The static default, used when no row is stored.
    fn default_value(&self) -> SettingValue;

    /// Whether a stored `null` (cleared) is legal for the key.
    fn clearable(&self) -> bool;
}

macro_rules! setting_keys {
    (
        $(#[$doc:meta])*
        $name:ident {
            $($variant:ident => ($db:literal, $ty:expr, $clearable:literal, $default:expr)),+ $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl SettingKey for $name {
            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $db),+
                }
            }

            fn from_name(name: &str) -> Result<Self, CoreError> {
                match name {
                    $($db => Ok($name::$variant),)+
                    other => Err(CoreError::unknown_key(other)),
                }
            }

            fn setting_type(&self) -> SettingType {
                match self {
                    $($name::$variant => $ty),+
                }
            }

            fn default_value(&self) -> SettingValue {
                match self {
                    $($name::$variant => $default),+
                }
            }

            fn clearable(&self) -> bool {
                match self {
                    $($name::$variant => $clearable),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_name(s)
            }
        }
    };
}

use SettingType as T;
use SettingValue as V;

setting_keys! {
    /// Guild-scoped settings keys.
    GuildSettingsKey {
        Prefix => ("prefix", T::String, false, V::String("!".into())),
        Lang => ("lang", T::String, false, V::String("en".into())),
        LogChannel => ("logChannel", T::Channel, true, V::None),
        ModLogChannel => ("modLogChannel", T::Channel, true, V::None),
        JoinMessage => (
            "joinMessage",
            T::String,
            true,
            V::String("{memberMention} **joined**; Invited by **{inviterName}** (**{numInvites}** invites)".into())
        ),
        JoinMessageChannel => ("joinMessageChannel", T::Channel, true, V::None),
        LeaveMessage => (
            "leaveMessage",
            T::String,
            true,
            V::String("{memberName} **left**; Invited by **{inviterName}**".into())
        ),
        LeaveMessageChannel => ("leaveMessageChannel", T::Channel, true, V::None),
        LeaderboardStyle => ("leaderboardStyle", T::String, false, V::String("normal".into())),
        HideLeftMembersFromLeaderboard => ("hideLeftMembersFromLeaderboard", T::Boolean, false, V::Bool(false)),
        AutoSubtractFakes => ("autoSubtractFakes", T::Boolean, false, V::Bool(true)),
        AutoSubtractLeaves => ("autoSubtractLeaves", T::Boolean, false, V::Bool(true)),
        AutoSubtractLeaveThreshold => ("autoSubtractLeaveThreshold", T::Number, false, V::Number(600)),
        RankAssignmentStyle => ("rankAssignmentStyle", T::String, false, V::String("all".into())),
        RankAnnouncementChannel => ("rankAnnouncementChannel", T::Channel, true, V::None),
        RankAnnouncementMessage => (
            "rankAnnouncementMessage",
            T::String,
            true,
            V::String("Congratulations, **{memberMention}** has reached the **{rankName}** rank!".into())
        ),
        MutedRole => ("mutedRole", T::Role, true, V::None),
        ModPunishmentBanDeleteMessage => ("modPunishmentBanDeleteMessage", T::Boolean, false, V::Bool(true)),
        ModPunishmentKickDeleteMessage => ("modPunishmentKickDeleteMessage", T::Boolean, false, V::Bool(true)),
        ModPunishmentSoftbanDeleteMessage => ("modPunishmentSoftbanDeleteMessage", T::Boolean, false, V::Bool(true)),
        ModPunishmentMuteDeleteMessage => ("modPunishmentMuteDeleteMessage", T::Boolean, false, V::Bool(true)),
        ModPunishmentWarnDeleteMessage => ("modPunishmentWarnDeleteMessage", T::Boolean, false, V::Bool(true)),
    }
}

setting_keys! {
    /// Member-scoped settings keys.
    MemberSettingsKey {
        HideFromLeaderboard => ("hideFromLeaderboard", T::Boolean, false, V::Bool(false)),
    }
}

setting_keys! {
    /// Invite-code-scoped settings keys.
    InviteCodeSettingsKey {
        Name => ("name", T::String, true, V::None),
        Roles => ("roles", T::RoleList, true, V::None),
    }
}
