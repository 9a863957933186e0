//! Common identifier newtypes for the Usher backend.
//!
//! Every entity the chat platform hands us is addressed by a snowflake: a
//! 64-bit identifier whose high 42 bits encode a timestamp and whose low
//! 22 bits are internal worker/sequence counters. We wrap the raw `u64` in
//! per-entity newtypes so a guild id can never be passed where a role id is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Number of low bits in a snowflake that hold worker/sequence counters.
///
/// Snowflake-specific: if the platform ever changes its identifier layout
/// this constant must be re-derived, it is not portable to other schemes.
pub const SNOWFLAKE_SEQUENCE_BITS: u32 = 22;

macro_rules! snowflake_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates an identifier from the raw snowflake value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Returns the timestamp portion of the snowflake, i.e. the
            /// identifier with its worker/sequence bits discarded.
            pub const fn timestamp_bits(self) -> u64 {
                self.0 >> SNOWFLAKE_SEQUENCE_BITS
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

snowflake_id! {
    /// A guild (server/tenant) identifier. The primary sharding and
    /// settings-scoping unit.
    GuildId
}

snowflake_id! {
    /// A member (user) identifier.
    MemberId
}

snowflake_id! {
    /// A role identifier. Roles are always compared by id, never by
    /// structural identity, so two snapshots of the same role agree.
    RoleId
}

snowflake_id! {
    /// A text channel identifier.
    ChannelId
}

snowflake_id! {
    /// A shard-local message identifier.
    MessageId
}
