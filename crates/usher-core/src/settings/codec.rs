//! Settings codec: encode/decode between typed values and stored strings.
//!
//! The relational store keeps every setting as a nullable string column.
//! Encoding is driven by the key's declared type and is the exact inverse
//! of decoding:
//!
//! - channel/role references reduce to their identifier string
//! - booleans reduce to `"true"` / `"false"`
//! - list types join element encodings with `,`
//! - everything else passes through
//!
//! A stored `NULL` is the cleared state and is only legal for clearable
//! keys; an *absent* row decodes to the key's static default.

use crate::error::{CoreError, Result};
use crate::settings::keys::SettingKey;
use crate::settings::value::{SettingType, SettingValue};
use crate::types::{ChannelId, RoleId};

/// Separator for list-typed values. Part of the stored format, do not change.
const LIST_SEPARATOR: char = ',';

/// Input sentinels that clear a value (legacy command-surface spellings).
const CLEAR_SENTINELS: [&str; 3] = ["none", "empty", "null"];

/// Input sentinel that resets a key to its static default.
const DEFAULT_SENTINEL: &str = "default";

/// Resolves the write-path sentinels before validation.
///
/// The literal string `"default"` resets the key to its static default
/// rather than storing that string; `"none"`, `"empty"` and `"null"`
/// request a clear. Non-sentinel values pass through unchanged.
pub fn resolve_sentinels<K: SettingKey>(key: K, value: SettingValue) -> SettingValue {
    if let Some(s) = value.as_str() {
        if s == DEFAULT_SENTINEL {
            return key.default_value();
        }
        if CLEAR_SENTINELS.contains(&s) {
            return SettingValue::None;
        }
    }
    value
}

/// Encodes a typed value for storage under `key`.
///
/// Returns `Ok(None)` for a clear. Rejects a clear on a non-clearable key
/// and a value that does not conform to the key's declared type, in both
/// cases before anything touches the store.
pub fn encode<K: SettingKey>(key: K, value: &SettingValue) -> Result<Option<String>> {
    if value.is_none() {
        if !key.clearable() {
            return Err(CoreError::not_clearable(key.as_str()));
        }
        return Ok(None);
    }

    if !value.conforms_to(key.setting_type()) {
        return Err(CoreError::invalid_value(
            key.as_str(),
            format!(
                "expected {:?}, got {:?}",
                key.setting_type(),
                value.setting_type()
            ),
        ));
    }

    Ok(Some(encode_value(value)))
}

fn encode_value(value: &SettingValue) -> String {
    match value {
        // Callers check for None before reaching here.
        SettingValue::None => String::new(),
        SettingValue::String(s) => s.clone(),
        SettingValue::Number(n) => n.to_string(),
        SettingValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        SettingValue::Channel(c) => c.to_string(),
        SettingValue::Role(r) => r.to_string(),
        SettingValue::StringList(items) => join(items.iter().cloned()),
        SettingValue::ChannelList(items) => join(items.iter().map(|c| c.to_string())),
        SettingValue::RoleList(items) => join(items.iter().map(|r| r.to_string())),
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(&LIST_SEPARATOR.to_string())
}

/// Decodes the stored cell of an *existing* row.
///
/// A stored `NULL` decodes to the cleared state.
pub fn decode_cell<K: SettingKey>(key: K, cell: Option<&str>) -> Result<SettingValue> {
    match cell {
        None => Ok(SettingValue::None),
        Some(raw) => parse(key, raw),
    }
}

/// Decodes a possibly-absent row: no row at all yields the key's default.
pub fn decode<K: SettingKey>(key: K, row: Option<Option<&str>>) -> Result<SettingValue> {
    match row {
        None => Ok(key.default_value()),
        Some(cell) => decode_cell(key, cell),
    }
}

fn parse<K: SettingKey>(key: K, raw: &str) -> Result<SettingValue> {
    match key.setting_type() {
        SettingType::String => Ok(SettingValue::String(raw.to_string())),
        SettingType::Number => raw
            .parse::<i64>()
            .map(SettingValue::Number)
            .map_err(|e| CoreError::decode(key.as_str(), raw, e.to_string())),
        SettingType::Boolean => Ok(SettingValue::Bool(raw == "true")),
        SettingType::Channel => raw
            .parse::<ChannelId>()
            .map(SettingValue::Channel)
            .map_err(|e| CoreError::decode(key.as_str(), raw, e.to_string())),
        SettingType::Role => raw
            .parse::<RoleId>()
            .map(SettingValue::Role)
            .map_err(|e| CoreError::decode(key.as_str(), raw, e.to_string())),
        SettingType::StringList => Ok(SettingValue::StringList(split(raw).collect())),
        SettingType::ChannelList => split(raw)
            .map(|s| {
                s.parse::<ChannelId>()
                    .map_err(|e| CoreError::decode(key.as_str(), raw, e.to_string()))
            })
            .collect::<Result<Vec<_>>>()
            .map(SettingValue::ChannelList),
        SettingType::RoleList => split(raw)
            .map(|s| {
                s.parse::<RoleId>()
                    .map_err(|e| CoreError::decode(key.as_str(), raw, e.to_string()))
            })
            .collect::<Result<Vec<_>>>()
            .map(SettingValue::RoleList),
    }
}

fn split(raw: &str) -> impl Iterator<Item = String> + '_ {
    // An empty cell is an empty list, not a list of one empty string.
    raw.split(LIST_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
