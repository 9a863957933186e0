//! Guild-scoped configuration: keys, values, codec and decoded views.

pub mod codec;
mod guild;
mod keys;
mod value;

pub use guild::{GuildSettings, InviteCodeSettings, MemberSettings, SettingsView};
pub use keys::{GuildSettingsKey, InviteCodeSettingsKey, MemberSettingsKey, SettingKey};
pub use value::{SettingType, SettingValue};
