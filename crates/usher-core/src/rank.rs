//! Invite ranks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{GuildId, RoleId};

/// A role granted automatically once a member's invite total crosses a
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    /// The guild the rank belongs to.
    pub guild_id: GuildId,
    /// The role granted at the threshold.
    pub role_id: RoleId,
    /// The invite total required to reach the rank.
    pub num_invites: i64,
}

/// How rank roles are assigned when a member qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankAssignmentStyle {
    /// Grant every reached rank role.
    #[default]
    All,
    /// Grant only the highest-positioned reached role and strip the rest.
    Highest,
}

impl RankAssignmentStyle {
    /// The stored spelling of the style.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankAssignmentStyle::All => "all",
            RankAssignmentStyle::Highest => "highest",
        }
    }
}

impl fmt::Display for RankAssignmentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankAssignmentStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(RankAssignmentStyle::All),
            "highest" => Ok(RankAssignmentStyle::Highest),
            other => Err(CoreError::invalid_value(
                "rankAssignmentStyle",
                format!("unknown style '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_round_trips() {
        for style in [RankAssignmentStyle::All, RankAssignmentStyle::Highest] {
            assert_eq!(style.as_str().parse::<RankAssignmentStyle>().unwrap(), style);
        }
    }

    #[test]
    fn unknown_style_is_rejected() {
        assert!("best".parse::<RankAssignmentStyle>().is_err());
    }
}
