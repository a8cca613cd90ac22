//! Cryptographic hashing utilities for the ledger
//!
//! Provides the SHA-256 primitives used for block hashes, transaction ids
//! and signing digests, plus the hex leading-zero test used for proof of work.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes SHA-256 hash and returns it as a lowercase hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Number of leading zero hex characters in the rendering of `hash`.
///
/// Works on raw digest bytes so the miner never has to allocate a string
/// per attempt: each byte contributes two nibbles.
pub fn leading_zero_nibbles(hash: &[u8]) -> u32 {
    let mut count = 0;
    for byte in hash {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if *byte < 0x10 {
            count += 1;
        }
        break;
    }
    count
}

/// Checks if a raw digest meets the difficulty target
/// (at least `difficulty` leading zero hex characters)
pub fn meets_difficulty(hash: &[u8], difficulty: u32) -> bool {
    leading_zero_nibbles(hash) >= difficulty
}

/// Same check as [`meets_difficulty`] applied to an already rendered hex hash
pub fn hex_meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    let zeros = hash_hex.chars().take_while(|c| *c == '0').count();
    zeros >= difficulty as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            sha256_hex(data),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_leading_zero_nibbles() {
        assert_eq!(leading_zero_nibbles(&[0x00, 0x00, 0x0F, 0xFF]), 5);
        assert_eq!(leading_zero_nibbles(&[0x00, 0x10]), 2);
        assert_eq!(leading_zero_nibbles(&[0xAB]), 0);
        assert_eq!(leading_zero_nibbles(&[0x00; 4]), 8);
    }

    #[test]
    fn test_meets_difficulty() {
        let hash = [0x00, 0x00, 0x0F, 0xFF, 0xFF, 0xFF];
        assert!(meets_difficulty(&hash, 4));
        assert!(meets_difficulty(&hash, 5));
        assert!(!meets_difficulty(&hash, 6));
    }

    #[test]
    fn test_hex_and_byte_checks_agree() {
        for bytes in [[0x00, 0x0a, 0xff], [0x01, 0x00, 0x00], [0x00, 0x00, 0x00]] {
            let rendered = hex::encode(bytes);
            for difficulty in 0..=6 {
                assert_eq!(
                    meets_difficulty(&bytes, difficulty),
                    hex_meets_difficulty(&rendered, difficulty)
                );
            }
        }
    }
}
