//! Error types for the Usher core.
//!
//! All errors implement the standard `std::error::Error` trait via
//! `thiserror`. Functions that can fail return `Result<T, CoreError>`;
//! errors are values, handled at the boundary that can act on them.

use thiserror::Error;

/// Main error type for core domain operations.
///
/// Settings validation errors are raised *before* any store write so a
/// rejected mutation never leaves partial state behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A settings key name was not part of the closed enumeration.
    #[error("Unknown settings key '{name}'")]
    UnknownKey {
        /// The key name that was requested
        name: String,
    },

    /// An attempt was made to clear a key that is not clearable.
    #[error("Settings key '{key}' can not be cleared")]
    NotClearable {
        /// The key that was targeted
        key: String,
    },

    /// A value did not match the declared type of its key.
    #[error("Invalid value for key '{key}': {reason}")]
    InvalidValue {
        /// The key that was targeted
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A stored value could not be decoded back into its declared type.
    #[error("Failed to decode stored value '{raw}' for key '{key}': {reason}")]
    Decode {
        /// The key whose stored value is corrupt
        key: String,
        /// The raw stored string
        raw: String,
        /// What went wrong
        reason: String,
    },
}

impl CoreError {
    /// Creates an `UnknownKey` error.
    pub fn unknown_key(name: impl Into<String>) -> Self {
        CoreError::UnknownKey { name: name.into() }
    }

    /// Creates a `NotClearable` error.
    pub fn not_clearable(key: impl Into<String>) -> Self {
        CoreError::NotClearable { key: key.into() }
    }

    /// Creates an `InvalidValue` error.
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Decode` error.
    pub fn decode(
        key: impl Into<String>,
        raw: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::Decode {
            key: key.into(),
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a validation failure (caller error), as
    /// opposed to corrupt stored data.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownKey { .. }
                | CoreError::NotClearable { .. }
                | CoreError::InvalidValue { .. }
        )
    }
}

/// Convenience alias for core results.
pub type Result<T> = std::result::Result<T, CoreError>;
