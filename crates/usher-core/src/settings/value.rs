//! Typed settings values.
//!
//! The original backend dispatched encode/decode over string type tags at
//! runtime. Here the value space is a closed tagged union so the codec is
//! an exhaustive match, checked at compile time: adding a variant without
//! updating the codec does not build.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, RoleId};

/// The declared type of a settings key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingType {
    /// Free-form string (also covers string-backed enums like the language).
    String,
    /// Signed 64-bit integer.
    Number,
    /// Boolean, stored as `"true"` / `"false"`.
    Boolean,
    /// Reference to a text channel, stored as its id.
    Channel,
    /// Reference to a role, stored as its id.
    Role,
    /// Comma-joined list of strings.
    StringList,
    /// Comma-joined list of channel ids.
    ChannelList,
    /// Comma-joined list of role ids.
    RoleList,
}

/// A decoded settings value.
///
/// `None` is the cleared state: legal to store only for clearable keys,
/// and what a cleared key decodes to. An *absent* stored row is different
/// and decodes to the key's static default instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Cleared / unset.
    None,
    /// String value
    String(String),
    /// Integer value
    Number(i64),
    /// Boolean value
    Bool(bool),
    /// Channel reference
    Channel(ChannelId),
    /// Role reference
    Role(RoleId),
    /// List of strings
    StringList(Vec<String>),
    /// List of channel references
    ChannelList(Vec<ChannelId>),
    /// List of role references
    RoleList(Vec<RoleId>),
}

impl SettingValue {
    /// Returns true if the value is the cleared state.
    pub fn is_none(&self) -> bool {
        matches!(self, SettingValue::None)
    }

    /// Returns the value as a str if it matches.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it matches.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a bool if it matches.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a channel id if it matches.
    pub fn as_channel(&self) -> Option<ChannelId> {
        match self {
            SettingValue::Channel(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the value as a role id if it matches.
    pub fn as_role(&self) -> Option<RoleId> {
        match self {
            SettingValue::Role(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns the value as a role-id slice if it matches.
    pub fn as_role_list(&self) -> Option<&[RoleId]> {
        match self {
            SettingValue::RoleList(roles) => Some(roles),
            _ => None,
        }
    }

    /// Returns the `SettingType` this value conforms to, if any.
    ///
    /// `None` (the cleared state) conforms to every type and returns
    /// `Option::None` here.
    pub fn setting_type(&self) -> Option<SettingType> {
        match self {
            SettingValue::None => None,
            SettingValue::String(_) => Some(SettingType::String),
            SettingValue::Number(_) => Some(SettingType::Number),
            SettingValue::Bool(_) => Some(SettingType::Boolean),
            SettingValue::Channel(_) => Some(SettingType::Channel),
            SettingValue::Role(_) => Some(SettingType::Role),
            SettingValue::StringList(_) => Some(SettingType::StringList),
            SettingValue::ChannelList(_) => Some(SettingType::ChannelList),
            SettingValue::RoleList(_) => Some(SettingType::RoleList),
        }
    }

    /// Returns true if this value can be stored under a key of `ty`.
    pub fn conforms_to(&self, ty: SettingType) -> bool {
        match self.setting_type() {
            Some(own) => own == ty,
            None => true,
        }
    }
}

// ==========================================
// From Conversions for Ergonomics
// ==========================================

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Number(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::String(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::String(v)
    }
}

impl From<ChannelId> for SettingValue {
    fn from(v: ChannelId) -> Self {
        SettingValue::Channel(v)
    }
}

impl From<RoleId> for SettingValue {
    fn from(v: RoleId) -> Self {
        SettingValue::Role(v)
    }
}

impl From<Vec<RoleId>> for SettingValue {
    fn from(v: Vec<RoleId>) -> Self {
        SettingValue::RoleList(v)
    }
}

impl From<Vec<ChannelId>> for SettingValue {
    fn from(v: Vec<ChannelId>) -> Self {
        SettingValue::ChannelList(v)
    }
}
