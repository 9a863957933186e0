//! Invite counting.
//!
//! Invite totals are derived, never persisted: regular invites come from
//! raw invite-code uses, everything else from a signed ledger of custom
//! invite rows partitioned by their generation reason.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Why a custom-invite ledger row was generated.
///
/// An untagged row (`None` in [`LedgerEntry::reason`]) is a manual bonus
/// handed out by a moderator and counts as a custom invite. The `Clear*`
/// reasons are compensating rows written when counts are cleared; each
/// folds into the bucket it compensates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedReason {
    /// The join was flagged as fake.
    Fake,
    /// The joined member left again within the configured threshold.
    Leave,
    /// Compensates previously counted fakes.
    ClearFake,
    /// Compensates previously counted leaves.
    ClearLeave,
    /// Compensates regular joins.
    ClearRegular,
    /// Compensates manual bonuses.
    ClearCustom,
}

impl GeneratedReason {
    /// The stored spelling of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratedReason::Fake => "fake",
            GeneratedReason::Leave => "leave",
            GeneratedReason::ClearFake => "clear_fake",
            GeneratedReason::ClearLeave => "clear_leave",
            GeneratedReason::ClearRegular => "clear_regular",
            GeneratedReason::ClearCustom => "clear_custom",
        }
    }
}

impl fmt::Display for GeneratedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratedReason {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fake" => Ok(GeneratedReason::Fake),
            "leave" => Ok(GeneratedReason::Leave),
            "clear_fake" => Ok(GeneratedReason::ClearFake),
            "clear_leave" => Ok(GeneratedReason::ClearLeave),
            "clear_regular" => Ok(GeneratedReason::ClearRegular),
            "clear_custom" => Ok(GeneratedReason::ClearCustom),
            other => Err(CoreError::invalid_value(
                "generatedReason",
                format!("unknown reason '{other}'"),
            )),
        }
    }
}

/// One signed row of the custom-invite ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Signed invite amount.
    pub amount: i64,
    /// Generation reason; `None` is a manual bonus.
    pub reason: Option<GeneratedReason>,
}

/// Use counters of one invite code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUses {
    /// Total uses recorded by the platform.
    pub uses: i64,
    /// Uses already cleared by a moderator.
    pub cleared: i64,
}

/// Derived invite totals for one member of one guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InviteCounts {
    /// Joins through the member's own invite codes, net of cleared uses.
    pub regular: i64,
    /// Manual bonuses.
    pub custom: i64,
    /// Joins flagged as fake (usually negative).
    pub fake: i64,
    /// Joins invalidated by an early leave (usually negative).
    pub leave: i64,
    /// Sum of the four buckets.
    pub total: i64,
}

impl InviteCounts {
    /// Tallies invite totals from raw code uses and ledger rows.
    pub fn tally<'a>(
        codes: impl IntoIterator<Item = &'a CodeUses>,
        ledger: impl IntoIterator<Item = &'a LedgerEntry>,
    ) -> Self {
        let mut counts = InviteCounts::default();

        for code in codes {
            // A code can never contribute negatively, however much was cleared.
            counts.regular += (code.uses - code.cleared).max(0);
        }

        for entry in ledger {
            match entry.reason {
                None | Some(GeneratedReason::ClearCustom) => counts.custom += entry.amount,
                Some(GeneratedReason::Fake) | Some(GeneratedReason::ClearFake) => {
                    counts.fake += entry.amount;
                }
                Some(GeneratedReason::Leave) | Some(GeneratedReason::ClearLeave) => {
                    counts.leave += entry.amount;
                }
                Some(GeneratedReason::ClearRegular) => counts.regular += entry.amount,
            }
        }

        counts.total = counts.regular + counts.custom + counts.fake + counts.leave;
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tally_is_zero() {
        let counts = InviteCounts::tally([], []);
        assert_eq!(counts, InviteCounts::default());
    }

    #[test]
    fn regular_nets_cleared_uses() {
        let codes = [
            CodeUses { uses: 10, cleared: 3 },
            CodeUses { uses: 2, cleared: 5 },
        ];
        let counts = InviteCounts::tally(&codes, []);
        // 7 from the first code, 0 (not -3) from the second.
        assert_eq!(counts.regular, 7);
        assert_eq!(counts.total, 7);
    }

    #[test]
    fn ledger_partitions_by_reason() {
        let ledger = [
            LedgerEntry { amount: 5, reason: None },
            LedgerEntry { amount: -2, reason: Some(GeneratedReason::Fake) },
            LedgerEntry { amount: -1, reason: Some(GeneratedReason::Leave) },
            LedgerEntry { amount: 1, reason: Some(GeneratedReason::ClearFake) },
        ];
        let counts = InviteCounts::tally([], &ledger);
        assert_eq!(counts.custom, 5);
        assert_eq!(counts.fake, -1);
        assert_eq!(counts.leave, -1);
        assert_eq!(counts.total, 3);
    }

    #[test]
    fn clear_regular_folds_into_regular() {
        let codes = [CodeUses { uses: 4, cleared: 0 }];
        let ledger = [LedgerEntry {
            amount: -4,
            reason: Some(GeneratedReason::ClearRegular),
        }];
        let counts = InviteCounts::tally(&codes, &ledger);
        assert_eq!(counts.regular, 0);
        assert_eq!(counts.total, 0);
    }

    #[test]
    fn reason_round_trips() {
        for reason in [
            GeneratedReason::Fake,
            GeneratedReason::Leave,
            GeneratedReason::ClearFake,
            GeneratedReason::ClearLeave,
            GeneratedReason::ClearRegular,
            GeneratedReason::ClearCustom,
        ] {
            assert_eq!(reason.as_str().parse::<GeneratedReason>().unwrap(), reason);
        }
    }
}
