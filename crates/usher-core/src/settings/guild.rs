//! Decoded settings views.
//!
//! A settings view is built once from the stored rows of one entity and
//! then shared read-only behind an `Arc` by the cache layer: construction
//! starts from the static defaults and overlays whatever rows exist, so a
//! lookup never misses. Views are replaced wholesale on writes, never
//! mutated in place.

use indexmap::IndexMap;

use crate::error::Result;
use crate::rank::RankAssignmentStyle;
use crate::settings::codec;
use crate::settings::keys::{
    GuildSettingsKey, InviteCodeSettingsKey, MemberSettingsKey, SettingKey,
};
use crate::settings::value::SettingValue;
use crate::types::{ChannelId, RoleId};

/// A fully decoded, order-preserving settings mapping for one key family.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsView<K: SettingKey> {
    values: IndexMap<K, SettingValue>,
}

impl<K: SettingKey> SettingsView<K> {
    /// Builds a view holding every key's static default.
    pub fn defaults() -> Self {
        let values = K::all()
            .iter()
            .map(|k| (*k, k.default_value()))
            .collect();
        Self { values }
    }

    /// Builds a view from stored rows, starting from the defaults.
    ///
    /// Rows for keys that are no longer part of the enumeration are
    /// skipped; a row that fails to decode is an error (corrupt store).
    pub fn from_rows<'a>(
        rows: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> Result<Self> {
        let mut view = Self::defaults();
        for (name, cell) in rows {
            let Ok(key) = K::from_name(name) else {
                continue;
            };
            let value = codec::decode_cell(key, cell)?;
            view.values.insert(key, value);
        }
        Ok(view)
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: K) -> &SettingValue {
        // Construction populates every key, so the lookup cannot miss.
        self.values.get(&key).unwrap_or(&SettingValue::None)
    }

    /// Returns a copy of the view with `key` replaced by `value`.
    pub fn with(&self, key: K, value: SettingValue) -> Self {
        let mut values = self.values.clone();
        values.insert(key, value);
        Self { values }
    }

    /// Iterates over `(key, value)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &SettingValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

impl<K: SettingKey> Default for SettingsView<K> {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Guild settings with typed accessors for the values the core consumes.
pub type GuildSettings = SettingsView<GuildSettingsKey>;

impl GuildSettings {
    /// The command prefix.
    pub fn prefix(&self) -> &str {
        self.get(GuildSettingsKey::Prefix).as_str().unwrap_or("!")
    }

    /// The configured language.
    pub fn lang(&self) -> &str {
        self.get(GuildSettingsKey::Lang).as_str().unwrap_or("en")
    }

    /// The general log channel, if set.
    pub fn log_channel(&self) -> Option<ChannelId> {
        self.get(GuildSettingsKey::LogChannel).as_channel()
    }

    /// The moderation log channel, if set.
    pub fn mod_log_channel(&self) -> Option<ChannelId> {
        self.get(GuildSettingsKey::ModLogChannel).as_channel()
    }

    /// The muted role, if set.
    pub fn muted_role(&self) -> Option<RoleId> {
        self.get(GuildSettingsKey::MutedRole).as_role()
    }

    /// How rank roles are assigned on promotion.
    ///
    /// An unrecognized stored style falls back to assigning all ranks,
    /// which is also the static default.
    pub fn rank_assignment_style(&self) -> RankAssignmentStyle {
        self.get(GuildSettingsKey::RankAssignmentStyle)
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// The rank announcement channel, if set.
    pub fn rank_announcement_channel(&self) -> Option<ChannelId> {
        self.get(GuildSettingsKey::RankAnnouncementChannel).as_channel()
    }

    /// The rank announcement message template, if set.
    pub fn rank_announcement_message(&self) -> Option<&str> {
        self.get(GuildSettingsKey::RankAnnouncementMessage).as_str()
    }

    /// Minutes after a join within which a leave invalidates the invite.
    pub fn auto_subtract_leave_threshold(&self) -> i64 {
        self.get(GuildSettingsKey::AutoSubtractLeaveThreshold)
            .as_i64()
            .unwrap_or(600)
    }
}

/// Per-member settings.
pub type MemberSettings = SettingsView<MemberSettingsKey>;

impl MemberSettings {
    /// Whether the member opted out of the leaderboard.
    pub fn hide_from_leaderboard(&self) -> bool {
        self.get(MemberSettingsKey::HideFromLeaderboard)
            .as_bool()
            .unwrap_or(false)
    }
}

/// Per-invite-code settings.
pub type InviteCodeSettings = SettingsView<InviteCodeSettingsKey>;

impl InviteCodeSettings {
    /// The display name attached to the code, if set.
    pub fn name(&self) -> Option<&str> {
        self.get(InviteCodeSettingsKey::Name).as_str()
    }

    /// Roles granted to members who join through the code.
    pub fn roles(&self) -> &[RoleId] {
        self.get(InviteCodeSettingsKey::Roles)
            .as_role_list()
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_view_has_every_key() {
        let view = GuildSettings::defaults();
        assert_eq!(view.prefix(), "!");
        assert_eq!(view.lang(), "en");
        assert_eq!(view.rank_assignment_style(), RankAssignmentStyle::All);
        assert!(view.log_channel().is_none());
    }

    #[test]
    fn rows_overlay_defaults() {
        let rows = vec![
            ("prefix", Some("+")),
            ("rankAssignmentStyle", Some("highest")),
            ("rankAnnouncementChannel", Some("12345")),
        ];
        let view = GuildSettings::from_rows(rows).unwrap();
        assert_eq!(view.prefix(), "+");
        assert_eq!(view.rank_assignment_style(), RankAssignmentStyle::Highest);
        assert_eq!(view.rank_announcement_channel(), Some(ChannelId::new(12345)));
        // Untouched keys keep their defaults.
        assert_eq!(view.lang(), "en");
    }

    #[test]
    fn cleared_row_overrides_default() {
        let rows = vec![("joinMessage", None)];
        let view = GuildSettings::from_rows(rows).unwrap();
        assert!(view.get(GuildSettingsKey::JoinMessage).is_none());
    }

    #[test]
    fn unknown_row_is_skipped() {
        let rows = vec![("legacySetting", Some("x")), ("prefix", Some("?"))];
        let view = GuildSettings::from_rows(rows).unwrap();
        assert_eq!(view.prefix(), "?");
    }

    #[test]
    fn with_replaces_without_mutating() {
        let view = GuildSettings::defaults();
        let updated = view.with(GuildSettingsKey::Prefix, "$".into());
        assert_eq!(view.prefix(), "!");
        assert_eq!(updated.prefix(), "$");
    }

    #[test]
    fn views_compare_by_contents() {
        let defaults = GuildSettings::defaults();
        assert_eq!(GuildSettings::from_rows(vec![]).unwrap(), defaults);
        assert_ne!(defaults.with(GuildSettingsKey::Prefix, "$".into()), defaults);
    }

    #[test]
    fn invite_code_roles_default_empty() {
        let view = InviteCodeSettings::defaults();
        assert!(view.roles().is_empty());
        assert!(view.name().is_none());
    }
}
