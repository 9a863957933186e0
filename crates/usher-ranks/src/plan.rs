//! Pure promotion planning.
//!
//! Given the guild snapshot, the member's roles and their invite total,
//! [`plan_promotion`] computes which rank roles to grant and revoke. No IO
//! happens here; applying the plan is the engine's job.

use tracing::warn;
use usher_core::{Rank, RankAssignmentStyle, RoleId};

use crate::snapshot::{GuildRole, GuildSnapshot, Permissions};

/// The closest rank the member has not reached yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextRank {
    pub rank: Rank,
    pub role_name: String,
}

/// The computed outcome of one promotion pass.
///
/// `to_add` and `to_remove` are the mutations the bot can actually perform.
/// `should_have` and `should_not_have` list deserved and undeserved roles
/// that sit above the bot's highest role and can only be reported.
/// `dangerous` lists reached roles excluded because they grant guild-wide
/// control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPlan {
    pub num_ranks: usize,
    pub next_rank: Option<NextRank>,
    /// The highest reached assignable rank role, if any.
    pub highest: Option<RoleId>,
    /// Set when `highest` is a role the member does not hold yet; this is
    /// what rank announcements fire on.
    pub newly_reached: bool,
    pub to_add: Vec<RoleId>,
    pub to_remove: Vec<RoleId>,
    pub should_have: Vec<RoleId>,
    pub should_not_have: Vec<RoleId>,
    pub dangerous: Vec<RoleId>,
}

impl PromotionPlan {
    /// True when the pass changes nothing and reports nothing.
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty()
            && self.to_remove.is_empty()
            && self.should_have.is_empty()
            && self.should_not_have.is_empty()
            && self.dangerous.is_empty()
    }
}

/// Computes the promotion plan for one member.
pub fn plan_promotion(
    snapshot: &GuildSnapshot,
    member_roles: &[RoleId],
    ranks: &[Rank],
    total_invites: i64,
    style: RankAssignmentStyle,
) -> PromotionPlan {
    let mut plan = PromotionPlan {
        num_ranks: ranks.len(),
        ..PromotionPlan::default()
    };

    // Nothing configured, nothing to do.
    if ranks.is_empty() {
        return plan;
    }

    let mut reached: Vec<RoleId> = Vec::new();
    let mut not_reached: Vec<RoleId> = Vec::new();
    let mut highest: Option<&GuildRole> = None;

    for rank in ranks {
        let Some(role) = snapshot.role(rank.role_id) else {
            warn!(guild = %snapshot.guild_id, role = %rank.role_id, "rank role no longer exists, skipping");
            continue;
        };
        if rank.num_invites <= total_invites {
            if role.permissions.is_dangerous() {
                plan.dangerous.push(role.id);
                continue;
            }
            reached.push(role.id);
            if highest.is_none_or(|h| h.position < role.position) {
                highest = Some(role);
            }
        } else {
            not_reached.push(role.id);
            let closer = plan
                .next_rank
                .as_ref()
                .is_none_or(|n| rank.num_invites < n.rank.num_invites);
            if closer {
                plan.next_rank = Some(NextRank {
                    rank: *rank,
                    role_name: role.name.clone(),
                });
            }
        }
    }

    let highest_id = highest.map(|r| r.id);
    plan.highest = highest_id;
    plan.newly_reached = highest_id.is_some_and(|id| !member_roles.contains(&id));

    let ceiling = snapshot.bot_ceiling();
    // A role at or above the bot's own highest role cannot be granted or
    // revoked; changes to it are advisory only.
    let too_high = |id: RoleId| snapshot.role(id).is_some_and(|r| r.position >= ceiling);
    let held = |id: RoleId| member_roles.contains(&id);

    // Undeserved roles above the ceiling can only be reported.
    plan.should_not_have = not_reached
        .iter()
        .copied()
        .filter(|&id| too_high(id) && held(id))
        .collect();

    if !snapshot.bot.permissions.contains(Permissions::MANAGE_ROLES) {
        // Without role management the pass is report-only: wanted grants
        // and undeserved held roles are both reported, nothing is applied.
        plan.should_have = reached.iter().copied().filter(|&id| !held(id)).collect();
        plan.should_not_have.extend(
            not_reached
                .iter()
                .copied()
                .filter(|&id| !too_high(id) && held(id)),
        );
        return plan;
    }

    // Undeserved assignable roles always come off, whatever the style.
    plan.to_remove = not_reached
        .iter()
        .copied()
        .filter(|&id| !too_high(id) && held(id))
        .collect();

    match style {
        RankAssignmentStyle::All => {
            for id in reached.iter().copied().filter(|&id| !held(id)) {
                if too_high(id) {
                    plan.should_have.push(id);
                } else {
                    plan.to_add.push(id);
                }
            }
        }
        RankAssignmentStyle::Highest => {
            // Reached roles other than the highest come off as well.
            for id in reached
                .iter()
                .copied()
                .filter(|&id| Some(id) != highest_id && held(id))
            {
                if too_high(id) {
                    plan.should_not_have.push(id);
                } else {
                    plan.to_remove.push(id);
                }
            }
            if let Some(id) = highest_id {
                if !held(id) {
                    if too_high(id) {
                        plan.should_have.push(id);
                    } else {
                        plan.to_add.push(id);
                    }
                }
            }
        }
    }

    plan
}
