//! Shared harness for relay integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use usher_cache::{
    Caches, MemoryStore, PermissionOverride, SettingsRow, Store, StoreError,
};
use usher_core::{
    CodeUses, GuildId, LedgerEntry, MemberId, PunishmentConfig, Rank, StrikeConfig,
};
use usher_relay::{
    BusConfig, BusHandle, FlushPublisher, GatewayHandler, InvalidationBus, MemoryBroker,
    NoopGateway, Result as RelayResult, ShardId, ShardStatus,
};

/// Store wrapper that counts settings loads, for observing cache behavior.
pub struct CountingStore {
    inner: MemoryStore,
    settings_loads: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            settings_loads: AtomicUsize::new(0),
        }
    }

    pub fn settings_loads(&self) -> usize {
        self.settings_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn guild_settings(&self, guild: GuildId) -> Result<Vec<SettingsRow>, StoreError> {
        self.settings_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.guild_settings(guild).await
    }

    async fn write_guild_setting(
        &self,
        guild: GuildId,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        self.inner.write_guild_setting(guild, key, value).await
    }

    async fn member_settings(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<SettingsRow>, StoreError> {
        self.inner.member_settings(guild, member).await
    }

    async fn write_member_setting(
        &self,
        guild: GuildId,
        member: MemberId,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        self.inner
            .write_member_setting(guild, member, key, value)
            .await
    }

    async fn invite_code_settings(
        &self,
        guild: GuildId,
        code: &str,
    ) -> Result<Vec<SettingsRow>, StoreError> {
        self.inner.invite_code_settings(guild, code).await
    }

    async fn write_invite_code_setting(
        &self,
        guild: GuildId,
        code: &str,
        key: &str,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        self.inner
            .write_invite_code_setting(guild, code, key, value)
            .await
    }

    async fn permission_overrides(
        &self,
        guild: GuildId,
    ) -> Result<Vec<PermissionOverride>, StoreError> {
        self.inner.permission_overrides(guild).await
    }

    async fn is_premium(&self, guild: GuildId) -> Result<bool, StoreError> {
        self.inner.is_premium(guild).await
    }

    async fn punishment_configs(
        &self,
        guild: GuildId,
    ) -> Result<Vec<PunishmentConfig>, StoreError> {
        self.inner.punishment_configs(guild).await
    }

    async fn strike_configs(&self, guild: GuildId) -> Result<Vec<StrikeConfig>, StoreError> {
        self.inner.strike_configs(guild).await
    }

    async fn ranks(&self, guild: GuildId) -> Result<Vec<Rank>, StoreError> {
        self.inner.ranks(guild).await
    }

    async fn invite_code_uses(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<CodeUses>, StoreError> {
        self.inner.invite_code_uses(guild, member).await
    }

    async fn invite_ledger(
        &self,
        guild: GuildId,
        member: MemberId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.inner.invite_ledger(guild, member).await
    }

    fn name(&self) -> &str {
        "counting-memory"
    }
}

/// Gateway that records every delegated action.
#[derive(Default)]
pub struct RecordingGateway {
    pub left_guilds: Mutex<Vec<GuildId>>,
    pub owner_dms: Mutex<Vec<(GuildId, String)>>,
    pub user_dms: Mutex<Vec<(MemberId, String)>>,
    pub guild_count: AtomicUsize,
}

#[async_trait]
impl GatewayHandler for RecordingGateway {
    async fn status(&self) -> ShardStatus {
        ShardStatus {
            connected: true,
            guild_count: self.guild_count.load(Ordering::SeqCst) as u64,
        }
    }

    async fn owner_dm(&self, guild_id: GuildId, message: &str) -> RelayResult<()> {
        self.owner_dms.lock().push((guild_id, message.to_string()));
        Ok(())
    }

    async fn user_dm(&self, user_id: MemberId, message: &str) -> RelayResult<()> {
        self.user_dms.lock().push((user_id, message.to_string()));
        Ok(())
    }

    async fn leave_guild(&self, guild_id: GuildId) -> RelayResult<()> {
        self.left_guilds.lock().push(guild_id);
        Ok(())
    }
}

/// One shard process: its caches and the running bus.
pub struct Shard {
    pub caches: Arc<Caches>,
    pub handle: BusHandle,
}

pub fn bus_config(shard_id: ShardId, shard_count: u16) -> BusConfig {
    BusConfig {
        shard_id,
        shard_count,
        reconnect_delay: Duration::from_millis(10),
        max_backoff: Duration::from_millis(100),
        ..BusConfig::default()
    }
}

/// Starts a shard over a shared broker and store with the given gateway.
/// Opt-in log output while debugging: `RUST_LOG=usher_relay=trace cargo test`.
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn start_shard_with(
    broker: &MemoryBroker,
    store: Arc<dyn Store>,
    gateway: Arc<dyn GatewayHandler>,
    shard_id: ShardId,
    shard_count: u16,
) -> Shard {
    init_test_tracing();
    let config = bus_config(shard_id, shard_count);
    let broker: Arc<dyn usher_relay::Broker> = Arc::new(broker.clone());
    let notifier = Arc::new(FlushPublisher::new(Arc::clone(&broker), &config));
    let caches = Arc::new(Caches::new(store, notifier));
    let bus = InvalidationBus::new(broker, Arc::clone(&caches), gateway, config);
    let handle = bus.start();
    Shard { caches, handle }
}

pub fn start_shard(
    broker: &MemoryBroker,
    store: Arc<dyn Store>,
    shard_id: ShardId,
    shard_count: u16,
) -> Shard {
    start_shard_with(broker, store, Arc::new(NoopGateway), shard_id, shard_count)
}

/// Polls `probe` until it returns true or the deadline passes.
pub async fn wait_until<F, Fut>(deadline: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if probe().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

/// Waits until a shard's bus reports connected.
pub async fn wait_connected(shard: &Shard) {
    let connected = wait_until(Duration::from_secs(1), || async {
        shard.handle.state().is_connected()
    })
    .await;
    assert!(connected, "bus never connected");
}
