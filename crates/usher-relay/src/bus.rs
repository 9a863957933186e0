//! The invalidation bus.
//!
//! Each shard runs one [`InvalidationBus`]: a background task subscribed to
//! the flush channel, the shard broadcast channel, and its own directed
//! channel. Flush notices from other shards evict local cache entries;
//! command envelopes are answered locally or delegated to the gateway. The
//! bus reconnects with exponential backoff when the broker goes away, and
//! malformed traffic is logged and dropped, never fatal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};
use usher_cache::{CacheName, Caches, FlushNotifier};
use usher_core::{GuildId, MemberId};

use crate::broker::{Broker, Subscription};
use crate::envelope::{FlushNotice, ShardCommand, ShardEnvelope, ShardId, ShardStatus};
use crate::error::Result;
use crate::state::BusState;

/// Bus tuning and addressing.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Channel name prefix shared by every process on the bus.
    pub prefix: String,
    /// This shard's one-based id.
    pub shard_id: ShardId,
    /// Total number of shards.
    pub shard_count: u16,
    /// Delay before the first reconnect attempt.
    pub reconnect_delay: Duration,
    /// Backoff multiplier applied after each failed attempt.
    pub backoff_multiplier: f64,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            prefix: "usher".to_string(),
            shard_id: 1,
            shard_count: 1,
            reconnect_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl BusConfig {
    /// Channel carrying flush notices, subscribed by every shard.
    pub fn flush_channel(&self) -> String {
        format!("{}.flush", self.prefix)
    }

    /// Channel carrying broadcast commands, subscribed by every shard.
    pub fn broadcast_channel(&self) -> String {
        format!("{}.shards", self.prefix)
    }

    /// Directed channel for a single shard.
    pub fn shard_channel(&self, shard_id: ShardId) -> String {
        format!("{}.shard.{}", self.prefix, shard_id)
    }

    /// Channel the manager listens on for replies.
    pub fn manager_channel(&self) -> String {
        format!("{}.manager", self.prefix)
    }
}

/// Shard-local actions the bus delegates but does not perform itself.
///
/// The bus owns the protocol; the gateway owns the chat connection. The
/// default implementations make a handler that only reports status, which
/// is enough for processes that never receive directed commands.
#[async_trait]
pub trait GatewayHandler: Send + Sync {
    /// Current gateway health, reported in STATUS replies.
    async fn status(&self) -> ShardStatus;

    /// Detailed diagnostic payload for DIAGNOSE replies.
    async fn diagnose(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Delivers a message to the owner of a guild.
    async fn owner_dm(&self, guild_id: GuildId, message: &str) -> Result<()> {
        let _ = (guild_id, message);
        Ok(())
    }

    /// Delivers a message to a user.
    async fn user_dm(&self, user_id: MemberId, message: &str) -> Result<()> {
        let _ = (user_id, message);
        Ok(())
    }

    /// Leaves a guild.
    async fn leave_guild(&self, guild_id: GuildId) -> Result<()> {
        let _ = guild_id;
        Ok(())
    }

    /// Handles CUSTOM and SUDO envelopes. A `Some` return is published as a
    /// reply to the manager.
    async fn custom(&self, envelope: &ShardEnvelope) -> Option<serde_json::Value> {
        let _ = envelope;
        None
    }
}

/// A gateway that reports itself connected and ignores everything else.
#[derive(Debug, Default, Clone)]
pub struct NoopGateway;

#[async_trait]
impl GatewayHandler for NoopGateway {
    async fn status(&self) -> ShardStatus {
        ShardStatus {
            connected: true,
            guild_count: 0,
        }
    }
}

/// Publishes flush notices for local write-throughs.
///
/// This is the [`FlushNotifier`] the caches are built with. Publish errors
/// are logged and swallowed: the local write already succeeded, and other
/// shards converge once the broker is back.
pub struct FlushPublisher {
    broker: Arc<dyn Broker>,
    channel: String,
    shard_id: ShardId,
}

impl FlushPublisher {
    pub fn new(broker: Arc<dyn Broker>, config: &BusConfig) -> Self {
        Self {
            broker,
            channel: config.flush_channel(),
            shard_id: config.shard_id,
        }
    }
}

#[async_trait]
impl FlushNotifier for FlushPublisher {
    async fn publish_flush(&self, cache: CacheName, key: String) {
        let notice = FlushNotice::new(cache.as_str(), key, self.shard_id);
        let payload = match serde_json::to_vec(&notice) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode flush notice");
                return;
            }
        };
        if let Err(e) = self.broker.publish(&self.channel, payload).await {
            warn!(
                cache = %notice.cache_name,
                key = %notice.key,
                error = %e,
                "failed to publish flush notice, peers stay stale until reconnect"
            );
        }
    }
}

/// Handle for controlling a running bus.
pub struct BusHandle {
    shutdown_tx: watch::Sender<bool>,
    state: Arc<BusState>,
}

impl BusHandle {
    /// Signals the bus to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Connection state of the running bus.
    pub fn state(&self) -> &Arc<BusState> {
        &self.state
    }
}

impl Drop for BusHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ChannelSet {
    flush: Subscription,
    broadcast: Subscription,
    direct: Subscription,
}

enum ServeExit {
    Shutdown,
    Lost,
}

/// Per-shard bus task: applies foreign flush notices and serves the shard
/// command protocol.
pub struct InvalidationBus {
    broker: Arc<dyn Broker>,
    caches: Arc<Caches>,
    gateway: Arc<dyn GatewayHandler>,
    config: BusConfig,
    state: Arc<BusState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlushCachePayload {
    #[serde(default)]
    cache: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDmPayload {
    user_id: MemberId,
    message: String,
}

impl InvalidationBus {
    pub fn new(
        broker: Arc<dyn Broker>,
        caches: Arc<Caches>,
        gateway: Arc<dyn GatewayHandler>,
        config: BusConfig,
    ) -> Self {
        Self {
            broker,
            caches,
            gateway,
            config,
            state: Arc::new(BusState::new()),
        }
    }

    pub fn state(&self) -> &Arc<BusState> {
        &self.state
    }

    /// Starts the background bus task.
    ///
    /// Returns a handle that stops the bus when dropped.
    pub fn start(self) -> BusHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = BusHandle {
            shutdown_tx,
            state: Arc::clone(&self.state),
        };

        tokio::spawn(self.run(shutdown_rx));

        handle
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut backoff = self.config.reconnect_delay;

        info!(
            shard = self.config.shard_id,
            shards = self.config.shard_count,
            broker = self.broker.name(),
            "starting invalidation bus"
        );

        loop {
            self.state.record_connecting();
            let channels = match self.connect().await {
                Ok(channels) => {
                    self.state.record_connected();
                    backoff = self.config.reconnect_delay;
                    info!(shard = self.config.shard_id, "bus connected");
                    channels
                }
                Err(e) => {
                    self.state.record_failure(e.to_string());
                    warn!(
                        shard = self.config.shard_id,
                        error = %e,
                        retry_in = ?backoff,
                        "bus connection failed"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        result = shutdown_rx.changed() => {
                            if result.is_err() || *shutdown_rx.borrow() {
                                info!("invalidation bus shutting down");
                                return;
                            }
                        }
                    }
                    backoff = next_backoff(backoff, &self.config);
                    continue;
                }
            };

            match self.serve(channels, &mut shutdown_rx).await {
                ServeExit::Shutdown => {
                    info!("invalidation bus shutting down");
                    return;
                }
                ServeExit::Lost => {
                    self.state.record_failure("broker stream closed");
                    warn!(shard = self.config.shard_id, "bus stream lost, reconnecting");
                }
            }
        }
    }

    async fn connect(&self) -> Result<ChannelSet> {
        self.broker.ensure_connected().await?;
        Ok(ChannelSet {
            flush: self.broker.subscribe(&self.config.flush_channel()).await?,
            broadcast: self
                .broker
                .subscribe(&self.config.broadcast_channel())
                .await?,
            direct: self
                .broker
                .subscribe(&self.config.shard_channel(self.config.shard_id))
                .await?,
        })
    }

    async fn serve(
        &self,
        mut channels: ChannelSet,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> ServeExit {
        loop {
            tokio::select! {
                msg = channels.flush.recv() => match msg {
                    Some(raw) => self.handle_flush(&raw).await,
                    None => return ServeExit::Lost,
                },
                msg = channels.broadcast.recv() => match msg {
                    Some(raw) => self.handle_envelope(&raw).await,
                    None => return ServeExit::Lost,
                },
                msg = channels.direct.recv() => match msg {
                    Some(raw) => self.handle_envelope(&raw).await,
                    None => return ServeExit::Lost,
                },
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        return ServeExit::Shutdown;
                    }
                }
            }
        }
    }

    async fn handle_flush(&self, raw: &[u8]) {
        let notice: FlushNotice = match serde_json::from_slice(raw) {
            Ok(notice) => notice,
            Err(e) => {
                warn!(error = %e, "malformed flush notice, ignoring");
                return;
            }
        };

        // The originating shard already holds the canonical entry.
        if notice.origin_shard_id == self.config.shard_id {
            trace!(cache = %notice.cache_name, key = %notice.key, "own flush notice, skipping");
            return;
        }

        debug!(
            cache = %notice.cache_name,
            key = %notice.key,
            origin = notice.origin_shard_id,
            "applying flush notice"
        );
        self.caches
            .flush_named(&notice.cache_name, &notice.key)
            .await;
    }

    async fn handle_envelope(&self, raw: &[u8]) {
        let envelope: ShardEnvelope = match serde_json::from_slice(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "malformed shard envelope, ignoring");
                return;
            }
        };

        debug!(id = %envelope.id, cmd = ?envelope.cmd, "handling shard envelope");

        match envelope.cmd {
            ShardCommand::Status => {
                let status = self.gateway.status().await;
                match serde_json::to_value(status) {
                    Ok(payload) => self.send_reply(&envelope, payload).await,
                    Err(e) => warn!(error = %e, "failed to encode status reply"),
                }
            }
            ShardCommand::Diagnose => {
                let payload = serde_json::json!({
                    "bus": {
                        "state": self.state.state().as_str(),
                        "failures": self.state.failure_count(),
                        "lastError": self.state.last_error(),
                    },
                    "gateway": self.gateway.diagnose().await,
                });
                self.send_reply(&envelope, payload).await;
            }
            ShardCommand::FlushCache => self.handle_flush_command(&envelope).await,
            ShardCommand::OwnerDm => {
                let Some(guild_id) = envelope.guild_id else {
                    warn!(id = %envelope.id, "OWNER_DM without guild id, ignoring");
                    return;
                };
                match serde_json::from_value::<MessagePayload>(envelope.payload.clone()) {
                    Ok(payload) => {
                        if let Err(e) = self.gateway.owner_dm(guild_id, &payload.message).await {
                            warn!(guild = %guild_id, error = %e, "owner dm failed");
                        }
                    }
                    Err(e) => warn!(id = %envelope.id, error = %e, "bad OWNER_DM payload"),
                }
            }
            ShardCommand::UserDm => {
                match serde_json::from_value::<UserDmPayload>(envelope.payload.clone()) {
                    Ok(payload) => {
                        if let Err(e) = self.gateway.user_dm(payload.user_id, &payload.message).await
                        {
                            warn!(user = %payload.user_id, error = %e, "user dm failed");
                        }
                    }
                    Err(e) => warn!(id = %envelope.id, error = %e, "bad USER_DM payload"),
                }
            }
            ShardCommand::LeaveGuild => {
                let Some(guild_id) = envelope.guild_id else {
                    warn!(id = %envelope.id, "LEAVE_GUILD without guild id, ignoring");
                    return;
                };
                if let Err(e) = self.gateway.leave_guild(guild_id).await {
                    warn!(guild = %guild_id, error = %e, "leave guild failed");
                }
            }
            ShardCommand::Custom | ShardCommand::Sudo => {
                if let Some(payload) = self.gateway.custom(&envelope).await {
                    self.send_reply(&envelope, payload).await;
                }
            }
        }
    }

    async fn handle_flush_command(&self, envelope: &ShardEnvelope) {
        // An empty payload means a full flush.
        let payload: FlushCachePayload = if envelope.payload.is_null() {
            FlushCachePayload {
                cache: None,
                key: None,
            }
        } else {
            match serde_json::from_value(envelope.payload.clone()) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(id = %envelope.id, error = %e, "bad FLUSH_CACHE payload");
                    return;
                }
            }
        };

        match (payload.cache, payload.key) {
            (Some(cache), Some(key)) => {
                self.caches.flush_named(&cache, &key).await;
            }
            _ => {
                info!(shard = self.config.shard_id, "flushing all caches");
                self.caches.flush_all();
            }
        }
    }

    async fn send_reply(&self, request: &ShardEnvelope, payload: serde_json::Value) {
        let reply = request.reply(self.config.shard_id, payload);
        let raw = match serde_json::to_vec(&reply) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode reply envelope");
                return;
            }
        };
        if let Err(e) = self
            .broker
            .publish(&self.config.manager_channel(), raw)
            .await
        {
            warn!(id = %request.id, error = %e, "failed to publish reply");
        }
    }
}

fn next_backoff(current: Duration, config: &BusConfig) -> Duration {
    Duration::from_secs_f64(current.as_secs_f64() * config.backoff_multiplier)
        .min(config.max_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BusConfig::default();
        assert_eq!(config.prefix, "usher");
        assert_eq!(config.shard_id, 1);
        assert_eq!(config.shard_count, 1);
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_channel_names() {
        let config = BusConfig {
            prefix: "usher".to_string(),
            shard_id: 3,
            ..BusConfig::default()
        };
        assert_eq!(config.flush_channel(), "usher.flush");
        assert_eq!(config.broadcast_channel(), "usher.shards");
        assert_eq!(config.shard_channel(3), "usher.shard.3");
        assert_eq!(config.manager_channel(), "usher.manager");
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = BusConfig {
            max_backoff: Duration::from_secs(8),
            ..BusConfig::default()
        };
        let mut backoff = config.reconnect_delay;
        for _ in 0..10 {
            backoff = next_backoff(backoff, &config);
        }
        assert_eq!(backoff, Duration::from_secs(8));
    }

    #[test]
    fn test_bus_handle_stop() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = BusHandle {
            shutdown_tx,
            state: Arc::new(BusState::new()),
        };

        assert!(!*shutdown_rx.borrow());
        handle.stop();
        assert!(shutdown_rx.has_changed().unwrap_or(false) || *shutdown_rx.borrow());
    }
}
