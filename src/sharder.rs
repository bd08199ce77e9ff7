//! Sharder implementation.

/// Maps inputs to one of `total_shards` buckets, deterministically.
pub trait Sharder {
    /// Bucket of `input`, in `0..total_shards`.
    fn get_shard(&self, input: impl AsRef<[u8]>, total_shards: u64) -> u64;
}

/// The default (and only) sharder: IEEE CRC-32 of the input read as a signed 32-bit integer,
/// reduced to `0..total_shards` with a floored modulo.
///
/// Stores written by other rollout implementations bucket subjects the same way, so checksums with
/// the high bit set must stay negative before the reduction.
pub struct Crc32Sharder;

impl Sharder for Crc32Sharder {
    fn get_shard(&self, input: impl AsRef<[u8]>, total_shards: u64) -> u64 {
        let checksum = i64::from(crc32fast::hash(input.as_ref()) as i32);
        let total = i64::try_from(total_shards).unwrap_or(i64::MAX);
        checksum.rem_euclid(total) as u64
    }
}
