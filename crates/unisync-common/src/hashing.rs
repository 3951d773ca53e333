//! Stable hashing utilities for derived identifiers
//!
//! `std::hash` output is not stable across Rust releases, so identifiers that
//! are persisted are derived from SHA-256 instead.

use sha2::{Digest, Sha256};

/// Exclusive upper bound used for derived provenance ids.
pub const DEFAULT_ID_RANGE: u64 = 100_000_000;

/// Hash a string to a `u64` using the first eight bytes of its SHA-256 digest
pub fn stable_hash_str(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Hash a string into the half-open range `0..range`
///
/// A `range` of zero is treated as [`DEFAULT_ID_RANGE`].
pub fn stable_bounded_id(value: &str, range: u64) -> i64 {
    let range = if range == 0 { DEFAULT_ID_RANGE } else { range };
    // range fits in i64 for every caller; clamp anyway so the cast is lossless
    let bounded = stable_hash_str(value) % range.min(i64::MAX as u64);
    bounded as i64
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_stable_bounded_id_known_values() {
        assert_eq!(stable_bounded_id("bitcoin", DEFAULT_ID_RANGE), 56_073_200);
        assert_eq!(stable_bounded_id("ethereum", DEFAULT_ID_RANGE), 78_784_630);
        assert_eq!(stable_bounded_id("", DEFAULT_ID_RANGE), 24_261_652);
    }

    #[test]
    fn test_zero_range_falls_back_to_default() {
        assert_eq!(stable_bounded_id("hello world", 0), 17_134_600);
    }

    proptest! {
        #[test]
        fn prop_bounded_id_in_range(s in ".*", range in 1u64..1_000_000_000) {
            let id = stable_bounded_id(&s, range);
            prop_assert!(id >= 0);
            prop_assert!((id as u64) < range);
        }

        #[test]
        fn prop_bounded_id_deterministic(s in ".*") {
            prop_assert_eq!(
                stable_bounded_id(&s, DEFAULT_ID_RANGE),
                stable_bounded_id(&s, DEFAULT_ID_RANGE)
            );
        }
    }
}
