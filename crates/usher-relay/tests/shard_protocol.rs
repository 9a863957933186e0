//! Manager/shard command protocol over the bus.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use usher_cache::MemoryStore;
use usher_core::{GuildId, MemberId};
use usher_relay::{
    Broker, MemoryBroker, ShardCommand, ShardEnvelope, ShardHealth, ShardManager, ShardStatus,
};

use common::{
    CountingStore, RecordingGateway, bus_config, start_shard, start_shard_with, wait_connected,
    wait_until,
};

#[tokio::test]
async fn status_sweep_reports_missing_shards_as_down() {
    let broker = MemoryBroker::new();
    let store = MemoryStore::new();

    let gateway = Arc::new(RecordingGateway::default());
    gateway.guild_count.store(5, Ordering::SeqCst);

    // Only shard 1 of 2 is running.
    let shard1 = start_shard_with(
        &broker,
        Arc::new(store.clone()),
        Arc::clone(&gateway) as _,
        1,
        2,
    );
    wait_connected(&shard1).await;

    let manager = ShardManager::new(Arc::new(broker.clone()), bus_config(0, 2));
    let health = manager.health_check(Duration::from_millis(500)).await.unwrap();

    assert_eq!(
        health.shards.get(&1),
        Some(&ShardHealth::Up(ShardStatus {
            connected: true,
            guild_count: 5,
        }))
    );
    assert_eq!(health.shards.get(&2), Some(&ShardHealth::Down));
    assert!(!health.is_healthy());
    assert_eq!(health.up_count(), 1);
}

#[tokio::test]
async fn full_fleet_is_healthy() {
    let broker = MemoryBroker::new();
    let store = MemoryStore::new();

    let shard1 = start_shard_with(
        &broker,
        Arc::new(store.clone()),
        Arc::new(RecordingGateway::default()) as _,
        1,
        2,
    );
    let shard2 = start_shard_with(
        &broker,
        Arc::new(store.clone()),
        Arc::new(RecordingGateway::default()) as _,
        2,
        2,
    );
    wait_connected(&shard1).await;
    wait_connected(&shard2).await;

    let manager = ShardManager::new(Arc::new(broker.clone()), bus_config(0, 2));
    let health = manager.health_check(Duration::from_millis(500)).await.unwrap();

    assert!(health.is_healthy());
    assert_eq!(health.up_count(), 2);
}

#[tokio::test]
async fn flush_cache_command_evicts_one_entry() {
    let broker = MemoryBroker::new();
    let store = Arc::new(CountingStore::new(MemoryStore::new()));
    let guild = GuildId::new(7 << 22);

    let shard = start_shard(&broker, Arc::clone(&store) as _, 1, 1);
    wait_connected(&shard).await;

    shard.caches.settings.get(guild).await.unwrap();
    let loads_before = store.settings_loads();

    let manager = ShardManager::new(Arc::new(broker.clone()), bus_config(0, 1));
    manager
        .flush_entry("settings", &guild.to_string())
        .await
        .unwrap();

    let evicted = wait_until(Duration::from_secs(1), || async {
        shard.caches.settings.get(guild).await.unwrap();
        store.settings_loads() > loads_before
    })
    .await;
    assert!(evicted, "FLUSH_CACHE never evicted the entry");
}

#[tokio::test]
async fn flush_cache_without_target_flushes_everything() {
    let broker = MemoryBroker::new();
    let store = Arc::new(CountingStore::new(MemoryStore::new()));
    let guild_a = GuildId::new(1 << 22);
    let guild_b = GuildId::new(2 << 22);

    let shard = start_shard(&broker, Arc::clone(&store) as _, 1, 1);
    wait_connected(&shard).await;

    shard.caches.settings.get(guild_a).await.unwrap();
    shard.caches.settings.get(guild_b).await.unwrap();
    let loads_before = store.settings_loads();

    let manager = ShardManager::new(Arc::new(broker.clone()), bus_config(0, 1));
    manager.flush_everything().await.unwrap();

    let evicted = wait_until(Duration::from_secs(1), || async {
        shard.caches.settings.get(guild_a).await.unwrap();
        shard.caches.settings.get(guild_b).await.unwrap();
        store.settings_loads() >= loads_before + 2
    })
    .await;
    assert!(evicted, "FLUSH_CACHE broadcast did not clear the caches");
}

#[tokio::test]
async fn leave_guild_goes_to_the_owning_shard_only() {
    let broker = MemoryBroker::new();
    let store = MemoryStore::new();
    // 11 mod 2 == 1, so shard 2 owns this guild.
    let guild = GuildId::new(11 << 22);

    let gw1 = Arc::new(RecordingGateway::default());
    let gw2 = Arc::new(RecordingGateway::default());
    let shard1 = start_shard_with(&broker, Arc::new(store.clone()), Arc::clone(&gw1) as _, 1, 2);
    let shard2 = start_shard_with(&broker, Arc::new(store.clone()), Arc::clone(&gw2) as _, 2, 2);
    wait_connected(&shard1).await;
    wait_connected(&shard2).await;

    let manager = ShardManager::new(Arc::new(broker.clone()), bus_config(0, 2));
    let target = manager
        .send_to_guild(guild, ShardEnvelope::new(ShardCommand::LeaveGuild))
        .await
        .unwrap();
    assert_eq!(target, 2);

    let delivered = wait_until(Duration::from_secs(1), || async {
        gw2.left_guilds.lock().as_slice() == [guild]
    })
    .await;
    assert!(delivered, "owning shard never left the guild");
    assert!(gw1.left_guilds.lock().is_empty());
}

#[tokio::test]
async fn dm_commands_are_delegated_with_their_payloads() {
    let broker = MemoryBroker::new();
    let store = MemoryStore::new();
    let guild = GuildId::new(4 << 22);
    let user = MemberId::new(99);

    let gateway = Arc::new(RecordingGateway::default());
    let shard = start_shard_with(
        &broker,
        Arc::new(store.clone()),
        Arc::clone(&gateway) as _,
        1,
        1,
    );
    wait_connected(&shard).await;

    let manager = ShardManager::new(Arc::new(broker.clone()), bus_config(0, 1));
    manager
        .send_to_guild(
            guild,
            ShardEnvelope::new(ShardCommand::OwnerDm)
                .with_payload(json!({"message": "your invite settings changed"})),
        )
        .await
        .unwrap();
    manager
        .send_to_shard(
            1,
            &ShardEnvelope::new(ShardCommand::UserDm)
                .with_payload(json!({"userId": 99, "message": "hello"})),
        )
        .await
        .unwrap();

    let delivered = wait_until(Duration::from_secs(1), || async {
        !gateway.owner_dms.lock().is_empty() && !gateway.user_dms.lock().is_empty()
    })
    .await;
    assert!(delivered, "DM commands never reached the gateway");
    assert_eq!(
        gateway.owner_dms.lock().first(),
        Some(&(guild, "your invite settings changed".to_string()))
    );
    assert_eq!(gateway.user_dms.lock().first(), Some(&(user, "hello".to_string())));
}

#[tokio::test]
async fn malformed_envelopes_do_not_kill_the_bus() {
    let broker = MemoryBroker::new();
    let store = MemoryStore::new();

    let gateway = Arc::new(RecordingGateway::default());
    let shard = start_shard_with(
        &broker,
        Arc::new(store.clone()),
        Arc::clone(&gateway) as _,
        1,
        1,
    );
    wait_connected(&shard).await;

    broker
        .publish("usher.shard.1", b"\xff\xfe garbage".to_vec())
        .await
        .unwrap();
    broker
        .publish("usher.shards", br#"{"cmd": "NOT_A_COMMAND"}"#.to_vec())
        .await
        .unwrap();

    let manager = ShardManager::new(Arc::new(broker.clone()), bus_config(0, 1));
    let health = manager.health_check(Duration::from_millis(500)).await.unwrap();
    assert!(health.is_healthy());
}
