//! Non-cryptographic FNV-1a digest
//!
//! Used for the audit chain tokens and the artifact's query digest. This
//! is a demonstration linkage, not a security primitive: collisions are
//! possible and acceptable here.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the input bytes.
pub fn fnv1a_64(input: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in input.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hex-encoded digest with a `0x` prefix.
pub fn fnv1a_hex(input: &str) -> String {
    format!("0x{:016x}", fnv1a_64(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(fnv1a_hex("sphinx"), fnv1a_hex("sphinx"));
    }

    #[test]
    fn test_digest_differs_on_input() {
        assert_ne!(fnv1a_hex("sphinx"), fnv1a_hex("sphinx "));
    }

    #[test]
    fn test_known_vector() {
        // FNV-1a of the empty string is the offset basis
        assert_eq!(fnv1a_64(""), 0xcbf2_9ce4_8422_2325);
    }
}
