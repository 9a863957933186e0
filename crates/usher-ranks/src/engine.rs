//! Applies promotion plans through the chat gateway.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use usher_cache::Caches;
use usher_core::{ChannelId, GuildId, MemberId, RoleId};

use crate::error::Result;
use crate::plan::{PromotionPlan, plan_promotion};
use crate::snapshot::GuildSnapshot;

/// Role mutations and announcements the engine delegates to the gateway.
#[async_trait]
pub trait RoleGateway: Send + Sync {
    async fn add_role(&self, guild_id: GuildId, member_id: MemberId, role_id: RoleId)
    -> Result<()>;

    async fn remove_role(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        role_id: RoleId,
    ) -> Result<()>;

    /// Posts a rank announcement to a guild channel.
    async fn announce(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        message: String,
    ) -> Result<()>;
}

/// One attempted role mutation that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMutation {
    pub role_id: RoleId,
    pub reason: String,
}

/// The result of a promotion pass: the plan plus what actually happened.
///
/// A failed mutation never aborts the pass; the remaining mutations are
/// still attempted and the failure is recorded here.
#[derive(Debug, Clone, Default)]
pub struct PromotionOutcome {
    pub plan: PromotionPlan,
    pub added: Vec<RoleId>,
    pub removed: Vec<RoleId>,
    pub failed: Vec<FailedMutation>,
}

impl PromotionOutcome {
    pub fn fully_applied(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives promotions: loads config and ranks, plans, applies, announces.
pub struct PromotionEngine {
    caches: Arc<Caches>,
    gateway: Arc<dyn RoleGateway>,
}

impl PromotionEngine {
    pub fn new(caches: Arc<Caches>, gateway: Arc<dyn RoleGateway>) -> Self {
        Self { caches, gateway }
    }

    /// Runs a promotion pass with a caller-supplied invite total.
    pub async fn promote_if_qualified(
        &self,
        snapshot: &GuildSnapshot,
        member_id: MemberId,
        member_roles: &[RoleId],
        total_invites: i64,
    ) -> Result<PromotionOutcome> {
        let guild_id = snapshot.guild_id;
        let settings = self.caches.settings.get(guild_id).await?;
        let ranks = self.caches.store().ranks(guild_id).await?;

        let plan = plan_promotion(
            snapshot,
            member_roles,
            &ranks,
            total_invites,
            settings.rank_assignment_style(),
        );

        debug!(
            guild = %guild_id,
            member = %member_id,
            invites = total_invites,
            to_add = plan.to_add.len(),
            to_remove = plan.to_remove.len(),
            "promotion pass planned"
        );

        let mut outcome = PromotionOutcome {
            plan,
            ..PromotionOutcome::default()
        };

        for role_id in outcome.plan.to_remove.clone() {
            match self.gateway.remove_role(guild_id, member_id, role_id).await {
                Ok(()) => outcome.removed.push(role_id),
                Err(e) => {
                    warn!(guild = %guild_id, member = %member_id, role = %role_id, error = %e, "role removal failed");
                    outcome.failed.push(FailedMutation {
                        role_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        for role_id in outcome.plan.to_add.clone() {
            match self.gateway.add_role(guild_id, member_id, role_id).await {
                Ok(()) => outcome.added.push(role_id),
                Err(e) => {
                    warn!(guild = %guild_id, member = %member_id, role = %role_id, error = %e, "role grant failed");
                    outcome.failed.push(FailedMutation {
                        role_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if outcome.plan.newly_reached {
            self.announce_promotion(snapshot, member_id, total_invites, &outcome.plan, &settings)
                .await;
        }

        if !outcome.added.is_empty() || !outcome.removed.is_empty() {
            info!(
                guild = %guild_id,
                member = %member_id,
                added = outcome.added.len(),
                removed = outcome.removed.len(),
                failed = outcome.failed.len(),
                "promotion applied"
            );
        }

        Ok(outcome)
    }

    /// Runs a promotion pass using the member's current derived invite total.
    pub async fn promote_member(
        &self,
        snapshot: &GuildSnapshot,
        member_id: MemberId,
        member_roles: &[RoleId],
    ) -> Result<PromotionOutcome> {
        let counts = self
            .caches
            .invite_counts(snapshot.guild_id, member_id)
            .await?;
        self.promote_if_qualified(snapshot, member_id, member_roles, counts.total)
            .await
    }

    async fn announce_promotion(
        &self,
        snapshot: &GuildSnapshot,
        member_id: MemberId,
        total_invites: i64,
        plan: &PromotionPlan,
        settings: &usher_core::GuildSettings,
    ) {
        let Some(role_id) = plan.highest else {
            return;
        };
        let (Some(channel_id), Some(template)) = (
            settings.rank_announcement_channel(),
            settings.rank_announcement_message(),
        ) else {
            return;
        };

        let role_name = snapshot
            .role(role_id)
            .map(|r| r.name.as_str())
            .unwrap_or_default();
        let message = render_announcement(template, member_id, role_id, role_name, total_invites);

        if let Err(e) = self
            .gateway
            .announce(snapshot.guild_id, channel_id, message)
            .await
        {
            warn!(guild = %snapshot.guild_id, channel = %channel_id, error = %e, "rank announcement failed");
        }
    }
}

/// Fills the announcement template's placeholders.
fn render_announcement(
    template: &str,
    member_id: MemberId,
    role_id: RoleId,
    role_name: &str,
    total_invites: i64,
) -> String {
    template
        .replace("{memberId}", &member_id.to_string())
        .replace("{memberMention}", &format!("<@{member_id}>"))
        .replace("{rankMention}", &format!("<@&{role_id}>"))
        .replace("{rankName}", role_name)
        .replace("{totalInvites}", &total_invites.to_string())
}
