//! Invite-rank promotion for the Usher backend.
//!
//! [`plan_promotion`] is the pure planning step: given a guild snapshot, a
//! member's roles and their invite total, it decides which rank roles to
//! grant and revoke, honoring the bot's role ceiling and excluding roles
//! that grant guild-wide control. [`PromotionEngine`] wraps it with the
//! cached guild settings and applies the plan through a [`RoleGateway`].

pub mod engine;
pub mod error;
pub mod plan;
pub mod snapshot;

pub use engine::{FailedMutation, PromotionEngine, PromotionOutcome, RoleGateway};
pub use error::{RankError, Result};
pub use plan::{NextRank, PromotionPlan, plan_promotion};
pub use snapshot::{BotMember, GuildRole, GuildSnapshot, Permissions};
