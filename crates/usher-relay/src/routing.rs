//! Deterministic guild-to-shard assignment.

use usher_core::GuildId;

use crate::envelope::ShardId;

/// Computes the one-based shard that owns a guild.
///
/// Snowflake ids carry a millisecond timestamp above the low 22 bits of
/// worker/sequence noise, so shifting those bits away before taking the
/// modulus spreads guilds evenly across shards.
///
/// # Panics
///
/// Panics if `shard_count` is zero.
pub fn shard_for_guild(guild_id: GuildId, shard_count: u16) -> ShardId {
    assert!(shard_count > 0, "shard_count must be at least 1");
    (guild_id.timestamp_bits() % u64::from(shard_count)) as ShardId + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use usher_core::SNOWFLAKE_SEQUENCE_BITS;

    #[test]
    fn assignment_is_one_based() {
        // Timestamp bits divisible by the shard count land on shard 1.
        let guild = GuildId::new(8 << SNOWFLAKE_SEQUENCE_BITS);
        assert_eq!(shard_for_guild(guild, 4), 1);
    }

    #[test]
    fn assignment_ignores_sequence_bits() {
        let base = 6u64 << SNOWFLAKE_SEQUENCE_BITS;
        let with_noise = base | 0x3F_FFFF;
        assert_eq!(
            shard_for_guild(GuildId::new(base), 4),
            shard_for_guild(GuildId::new(with_noise), 4),
        );
        // 6 mod 4 == 2, one-based shard 3.
        assert_eq!(shard_for_guild(GuildId::new(base), 4), 3);
    }

    #[test]
    fn single_shard_owns_everything() {
        for raw in [1u64, 1 << 30, u64::MAX] {
            assert_eq!(shard_for_guild(GuildId::new(raw), 1), 1);
        }
    }

    #[test]
    #[should_panic(expected = "shard_count")]
    fn zero_shards_panics() {
        shard_for_guild(GuildId::new(1), 0);
    }
}
