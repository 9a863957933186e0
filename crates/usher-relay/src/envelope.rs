//! Wire types exchanged between shards and the manager.
//!
//! Two kinds of traffic cross the broker: [`FlushNotice`], broadcast on the
//! flush channel after every write-through, and [`ShardEnvelope`], the
//! command protocol between manager and shards. Both serialize as JSON with
//! camelCase fields.

use serde::{Deserialize, Serialize};
use usher_core::GuildId;

/// One-based shard identifier.
pub type ShardId = u16;

/// Broadcast after a write-through so other shards drop their stale copies.
///
/// A notice carries no value, only the address of the entry to evict. The
/// originating shard already holds the canonical entry and skips its own
/// notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushNotice {
    pub cache_name: String,
    pub key: String,
    pub origin_shard_id: ShardId,
}

impl FlushNotice {
    pub fn new(cache_name: impl Into<String>, key: impl Into<String>, origin: ShardId) -> Self {
        Self {
            cache_name: cache_name.into(),
            key: key.into(),
            origin_shard_id: origin,
        }
    }
}

/// Commands a manager can send to shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardCommand {
    /// Ask the shard to report its gateway status.
    Status,
    /// Drop cached entries, one or all.
    FlushCache,
    /// Free-form command handled by the gateway.
    Custom,
    /// Privileged free-form command.
    Sudo,
    /// Deliver a message to the owner of a guild.
    OwnerDm,
    /// Deliver a message to a specific user.
    UserDm,
    /// Make the shard leave a guild.
    LeaveGuild,
    /// Ask the shard for a detailed diagnostic report.
    Diagnose,
}

impl ShardCommand {
    /// Commands sent to every shard rather than a single owner.
    pub fn is_broadcast(self) -> bool {
        matches!(self, Self::Status | Self::FlushCache | Self::Diagnose)
    }
}

/// A single protocol message.
///
/// `payload` is opaque to the transport; each command defines its own shape.
/// `shard_id` identifies the sender on replies and the target on directed
/// sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardEnvelope {
    pub id: String,
    pub cmd: ShardCommand,
    #[serde(
        default,
        with = "guild_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub guild_id: Option<GuildId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_id: Option<ShardId>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl ShardEnvelope {
    pub fn new(cmd: ShardCommand) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            cmd,
            guild_id: None,
            shard_id: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn with_shard(mut self, shard_id: ShardId) -> Self {
        self.shard_id = Some(shard_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Reply envelope carrying the same correlation id.
    pub fn reply(&self, shard_id: ShardId, payload: serde_json::Value) -> Self {
        Self {
            id: self.id.clone(),
            cmd: self.cmd,
            guild_id: self.guild_id,
            shard_id: Some(shard_id),
            payload,
        }
    }
}

/// Guild ids cross the wire as decimal strings: snowflakes exceed the
/// 53-bit integer range of JSON consumers on the bus. Deserialization also
/// accepts a bare number for traffic from older senders.
mod guild_id_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use usher_core::GuildId;

    pub fn serialize<S: Serializer>(id: &Option<GuildId>, ser: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => ser.serialize_some(&id.to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<GuildId>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Option::<Raw>::deserialize(de)? {
            None => Ok(None),
            Some(Raw::Number(raw)) => Ok(Some(GuildId::new(raw))),
            Some(Raw::Text(text)) => text
                .parse::<GuildId>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Gateway health reported in a STATUS reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardStatus {
    pub connected: bool,
    pub guild_count: u64,
}
