//! Integration tests for the domain caches over the in-memory store.

mod common;

use common::caches;

use usher_core::{
    CodeUses, GeneratedReason, GuildId, GuildSettingsKey, InviteCodeSettingsKey, LedgerEntry,
    MemberId, MemberSettingsKey, PunishmentConfig, PunishmentType, RoleId, SettingValue,
};

#[tokio::test]
async fn settings_load_defaults_for_unknown_guild() {
    let (caches, _store) = caches();
    let settings = caches.settings.get(GuildId::new(1)).await.unwrap();

    assert_eq!(settings.prefix(), "!");
    assert_eq!(settings.lang(), "en");
}

#[tokio::test]
async fn set_one_returns_canonical_typed_value() {
    let (caches, _store) = caches();
    let guild = GuildId::new(1);

    // Booleans go to the store as "true"/"false" but come back typed.
    let value = caches
        .settings
        .set_one(guild, GuildSettingsKey::AutoSubtractFakes, false.into())
        .await
        .unwrap();
    assert_eq!(value, SettingValue::Bool(false));

    let settings = caches.settings.get(guild).await.unwrap();
    assert_eq!(
        settings.get(GuildSettingsKey::AutoSubtractFakes),
        &SettingValue::Bool(false)
    );
}

#[tokio::test]
async fn set_one_survives_flush() {
    let (caches, _store) = caches();
    let guild = GuildId::new(1);

    caches
        .settings
        .set_one(guild, GuildSettingsKey::Prefix, "+".into())
        .await
        .unwrap();
    caches.settings.flush(guild).await;

    // The reload comes from the store, not the evicted entry.
    let settings = caches.settings.get(guild).await.unwrap();
    assert_eq!(settings.prefix(), "+");
}

#[tokio::test]
async fn default_sentinel_resets_to_static_default() {
    let (caches, _store) = caches();
    let guild = GuildId::new(1);

    caches
        .settings
        .set_one(guild, GuildSettingsKey::Prefix, "+".into())
        .await
        .unwrap();

    let value = caches
        .settings
        .set_one(guild, GuildSettingsKey::Prefix, "default".into())
        .await
        .unwrap();
    assert_eq!(value, SettingValue::String("!".into()));
}

#[tokio::test]
async fn clearing_non_clearable_key_changes_nothing() {
    let (caches, store) = caches();
    let guild = GuildId::new(1);

    let err = caches
        .settings
        .set_one(guild, GuildSettingsKey::Prefix, SettingValue::None)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // Rejected before any store write: no partial state.
    use usher_cache::Store as _;
    assert!(store.guild_settings(guild).await.unwrap().is_empty());
}

#[tokio::test]
async fn clearing_clearable_key_decodes_to_none() {
    let (caches, _store) = caches();
    let guild = GuildId::new(1);

    caches
        .settings
        .set_one(
            guild,
            GuildSettingsKey::LogChannel,
            usher_core::ChannelId::new(42).into(),
        )
        .await
        .unwrap();

    let value = caches
        .settings
        .set_one(guild, GuildSettingsKey::LogChannel, "none".into())
        .await
        .unwrap();
    assert!(value.is_none());

    let settings = caches.settings.get(guild).await.unwrap();
    assert!(settings.log_channel().is_none());
}

#[tokio::test]
async fn member_settings_are_scoped_per_member() {
    let (caches, _store) = caches();
    let guild = GuildId::new(1);

    caches
        .member_settings
        .set_one(
            guild,
            MemberId::new(10),
            MemberSettingsKey::HideFromLeaderboard,
            true.into(),
        )
        .await
        .unwrap();

    let hidden = caches
        .member_settings
        .get(guild, MemberId::new(10))
        .await
        .unwrap();
    let visible = caches
        .member_settings
        .get(guild, MemberId::new(11))
        .await
        .unwrap();

    assert!(hidden.hide_from_leaderboard());
    assert!(!visible.hide_from_leaderboard());
}

#[tokio::test]
async fn invite_code_roles_round_trip() {
    let (caches, _store) = caches();
    let guild = GuildId::new(1);
    let roles = vec![RoleId::new(5), RoleId::new(6)];

    caches
        .invite_codes
        .set_one(
            guild,
            "aBc123",
            InviteCodeSettingsKey::Roles,
            roles.clone().into(),
        )
        .await
        .unwrap();

    let settings = caches.invite_codes.get(guild, "aBc123").await.unwrap();
    assert_eq!(settings.roles(), roles.as_slice());
}

#[tokio::test]
async fn flush_named_dispatches_by_cache_name() {
    let (caches, store) = caches();
    let guild = GuildId::new(1);

    store.set_premium(guild, false);
    assert!(!caches.premium.get(guild).await.unwrap());

    // The store changes behind the cache's back; a flush notice arrives.
    store.set_premium(guild, true);
    assert!(caches.flush_named("premium", "1").await);

    assert!(caches.premium.get(guild).await.unwrap());
}

#[tokio::test]
async fn flush_named_ignores_garbage() {
    let (caches, _store) = caches();

    assert!(!caches.flush_named("noSuchCache", "1").await);
    assert!(!caches.flush_named("settings", "not-a-guild-id").await);
    assert!(!caches.flush_named("memberSettings", "10").await);
}

#[tokio::test]
async fn punishment_configs_load_through_cache() {
    let (caches, store) = caches();
    let guild = GuildId::new(1);

    store.set_punishment_configs(
        guild,
        vec![PunishmentConfig {
            guild_id: guild,
            punishment_type: PunishmentType::Mute,
            amount: 3,
            args: "60".into(),
        }],
    );

    let configs = caches.punishments.get(guild).await.unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].punishment_type, PunishmentType::Mute);
}

#[tokio::test]
async fn invite_counts_combine_codes_and_ledger() {
    let (caches, store) = caches();
    let guild = GuildId::new(1);
    let member = MemberId::new(10);

    store.set_invite_code_uses(
        guild,
        member,
        vec![CodeUses { uses: 12, cleared: 2 }],
    );
    store.push_ledger_entry(
        guild,
        member,
        LedgerEntry {
            amount: 5,
            reason: None,
        },
    );
    store.push_ledger_entry(
        guild,
        member,
        LedgerEntry {
            amount: -3,
            reason: Some(GeneratedReason::Fake),
        },
    );

    let counts = caches.invite_counts(guild, member).await.unwrap();
    assert_eq!(counts.regular, 10);
    assert_eq!(counts.custom, 5);
    assert_eq!(counts.fake, -3);
    assert_eq!(counts.total, 12);
}
