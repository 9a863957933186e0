//! Manager-side view of the shard fleet.
//!
//! The manager never caches anything itself; it publishes command envelopes
//! and aggregates the replies. A shard that fails to answer a STATUS sweep
//! within the deadline is reported as down rather than erroring the sweep.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, warn};
use usher_core::GuildId;

use crate::broker::Broker;
use crate::bus::BusConfig;
use crate::envelope::{ShardCommand, ShardEnvelope, ShardId, ShardStatus};
use crate::error::Result;
use crate::routing::shard_for_guild;

/// Health of a single shard as seen from the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum ShardHealth {
    Up(ShardStatus),
    Down,
}

impl ShardHealth {
    pub fn is_up(self) -> bool {
        matches!(self, Self::Up(_))
    }
}

/// Aggregated result of a STATUS sweep.
#[derive(Debug, Clone, Serialize)]
pub struct FleetHealth {
    pub shards: BTreeMap<ShardId, ShardHealth>,
}

impl FleetHealth {
    /// True when every shard answered and reports a live gateway.
    pub fn is_healthy(&self) -> bool {
        self.shards
            .values()
            .all(|h| matches!(h, ShardHealth::Up(s) if s.connected))
    }

    pub fn up_count(&self) -> usize {
        self.shards.values().filter(|h| h.is_up()).count()
    }
}

/// Sends commands to shards and collects their replies.
pub struct ShardManager {
    broker: Arc<dyn Broker>,
    config: BusConfig,
}

impl ShardManager {
    pub fn new(broker: Arc<dyn Broker>, config: BusConfig) -> Self {
        Self { broker, config }
    }

    /// Publishes an envelope to every shard.
    pub async fn broadcast(&self, envelope: &ShardEnvelope) -> Result<()> {
        let raw = serde_json::to_vec(envelope)
            .map_err(|e| crate::error::RelayError::decode(e.to_string()))?;
        self.broker
            .publish(&self.config.broadcast_channel(), raw)
            .await
    }

    /// Publishes an envelope to one shard's directed channel.
    pub async fn send_to_shard(&self, shard_id: ShardId, envelope: &ShardEnvelope) -> Result<()> {
        let raw = serde_json::to_vec(envelope)
            .map_err(|e| crate::error::RelayError::decode(e.to_string()))?;
        self.broker
            .publish(&self.config.shard_channel(shard_id), raw)
            .await
    }

    /// Routes an envelope to the shard that owns `guild_id`.
    pub async fn send_to_guild(&self, guild_id: GuildId, envelope: ShardEnvelope) -> Result<ShardId> {
        let shard_id = shard_for_guild(guild_id, self.config.shard_count);
        let envelope = envelope.with_guild(guild_id).with_shard(shard_id);
        self.send_to_shard(shard_id, &envelope).await?;
        Ok(shard_id)
    }

    /// Tells every shard to drop one cache entry.
    pub async fn flush_entry(&self, cache: &str, key: &str) -> Result<()> {
        let envelope = ShardEnvelope::new(ShardCommand::FlushCache)
            .with_payload(serde_json::json!({ "cache": cache, "key": key }));
        self.broadcast(&envelope).await
    }

    /// Tells every shard to drop all cached entries.
    pub async fn flush_everything(&self) -> Result<()> {
        self.broadcast(&ShardEnvelope::new(ShardCommand::FlushCache))
            .await
    }

    /// Runs a STATUS sweep across the fleet.
    ///
    /// Waits up to `deadline` for replies; shards that do not answer in time
    /// are reported as [`ShardHealth::Down`]. Replies arriving after the
    /// deadline are dropped with the subscription.
    pub async fn health_check(&self, deadline: Duration) -> Result<FleetHealth> {
        let mut replies = self.broker.subscribe(&self.config.manager_channel()).await?;

        let request = ShardEnvelope::new(ShardCommand::Status);
        self.broadcast(&request).await?;

        let mut shards: BTreeMap<ShardId, ShardHealth> = (1..=self.config.shard_count)
            .map(|id| (id, ShardHealth::Down))
            .collect();
        let mut pending = usize::from(self.config.shard_count);

        let collect = async {
            while pending > 0 {
                let Some(raw) = replies.recv().await else {
                    break;
                };
                let reply: ShardEnvelope = match serde_json::from_slice(&raw) {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!(error = %e, "malformed reply on manager channel, ignoring");
                        continue;
                    }
                };
                if reply.id != request.id || reply.cmd != ShardCommand::Status {
                    debug!(id = %reply.id, "unrelated reply, ignoring");
                    continue;
                }
                let Some(shard_id) = reply.shard_id else {
                    warn!(id = %reply.id, "status reply without shard id, ignoring");
                    continue;
                };
                let status: ShardStatus = match serde_json::from_value(reply.payload) {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(shard = shard_id, error = %e, "bad status payload, ignoring");
                        continue;
                    }
                };
                if let Some(slot) = shards.get_mut(&shard_id) {
                    if !slot.is_up() {
                        pending -= 1;
                    }
                    *slot = ShardHealth::Up(status);
                } else {
                    warn!(shard = shard_id, "status reply from unknown shard, ignoring");
                }
            }
        };

        // A partial sweep is an answer, not an error.
        let _ = timeout(deadline, collect).await;

        Ok(FleetHealth { shards })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleet_health_requires_every_shard_connected() {
        let mut shards = BTreeMap::new();
        shards.insert(
            1,
            ShardHealth::Up(ShardStatus {
                connected: true,
                guild_count: 12,
            }),
        );
        shards.insert(2, ShardHealth::Down);
        let health = FleetHealth { shards };

        assert!(!health.is_healthy());
        assert_eq!(health.up_count(), 1);
    }

    #[test]
    fn disconnected_gateway_is_unhealthy_even_when_up() {
        let mut shards = BTreeMap::new();
        shards.insert(
            1,
            ShardHealth::Up(ShardStatus {
                connected: false,
                guild_count: 0,
            }),
        );
        let health = FleetHealth { shards };

        assert!(!health.is_healthy());
        assert_eq!(health.up_count(), 1);
    }
}
