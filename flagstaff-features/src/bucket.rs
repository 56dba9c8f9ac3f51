//! Identity Bucketing
//!
//! Maps an identity string onto one of N stable buckets. Bucket numbers are
//! derived from the FNV-1a 32-bit hash of the identity's UTF-8 bytes, so the
//! same identity lands in the same bucket on every platform and in every
//! process.

use tracing::warn;

/// Number of buckets used for percentage rollouts and variant assignment
pub const DEFAULT_BUCKETS: u32 = 1000;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a (32-bit) over raw bytes.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Get the bucket for an identity, in `[0, number_of_buckets)`.
///
/// Empty and whitespace-only identities always land in bucket `0`. A bucket
/// count of zero cannot be honored; it is logged and also yields bucket `0`.
///
/// # Examples
///
/// ```
/// use flagstaff_features::bucket::{get_bucket, DEFAULT_BUCKETS};
///
/// assert_eq!(get_bucket("rtam", DEFAULT_BUCKETS), 97);
/// assert_eq!(get_bucket("   ", DEFAULT_BUCKETS), 0);
/// ```
pub fn get_bucket(identity: &str, number_of_buckets: u32) -> u32 {
    if identity.trim().is_empty() {
        return 0;
    }

    if number_of_buckets == 0 {
        warn!(identity = %identity, "Bucket count must be positive, using bucket 0");
        return 0;
    }

    fnv1a_32(identity.as_bytes()) % number_of_buckets
}

/// Get the bucket for an identity using [`DEFAULT_BUCKETS`]
pub fn bucket_for(identity: &str) -> u32 {
    get_bucket(identity, DEFAULT_BUCKETS)
}

/// Get the bucket for an identity that may be absent
pub fn bucket_for_optional(identity: Option<&str>, number_of_buckets: u32) -> u32 {
    identity
        .map(|id| get_bucket(id, number_of_buckets))
        .unwrap_or(0)
}

/// Scale a bucket to a whole percentage (0-99), rounding down.
pub fn scaled_percentage(bucket: u32, number_of_buckets: u32) -> u32 {
    if number_of_buckets == 0 {
        return 0;
    }
    ((u64::from(bucket) * 100) / u64::from(number_of_buckets)) as u32
}
