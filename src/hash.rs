//! Name hashing for the intern tree.
//!
//! Two stages: a content hash over the raw bytes ([`rustc_hash::FxHasher`],
//! the same fast non-cryptographic hasher used throughout the compiler),
//! followed by a 64-bit avalanche finalizer so that near-identical names
//! land far apart in the tree's ordering key. Pure and deterministic.

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Hash a name for use as the intern tree's major ordering key.
#[inline]
pub fn hash_name(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    avalanche(hasher.finish())
}

/// 64-bit avalanche mix (splitmix64 finalizer).
///
/// Every input bit affects roughly half of the output bits, which keeps the
/// tree's hash comparisons well distributed even for dense name families
/// like `x0`, `x1`, `x2`, ...
#[inline]
fn avalanche(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_name(b"hello"), hash_name(b"hello"));
        assert_eq!(hash_name(b""), hash_name(b""));
    }

    #[test]
    fn test_hash_content_sensitive() {
        assert_ne!(hash_name(b"hello"), hash_name(b"hellp"));
        assert_ne!(hash_name(b"a"), hash_name(b"b"));
        assert_ne!(hash_name(b"ab"), hash_name(b"ba"));
    }

    #[test]
    fn test_avalanche_spreads_sequential_names() {
        // Dense name families should not cluster in the high bits, which
        // are what the tree compares first.
        let hashes: Vec<u64> = (0..64)
            .map(|i| hash_name(format!("x{i}").as_bytes()))
            .collect();
        let mut high_bytes: Vec<u8> = hashes.iter().map(|h| (h >> 56) as u8).collect();
        high_bytes.sort_unstable();
        high_bytes.dedup();
        assert!(
            high_bytes.len() > 16,
            "high bytes collapsed to {} distinct values",
            high_bytes.len()
        );
    }

    #[test]
    fn test_avalanche_single_bit_difference() {
        let a = avalanche(0);
        let b = avalanche(1);
        assert!((a ^ b).count_ones() >= 16);
    }
}
