//! 32-byte block hash.

use sha2::{Digest, Sha256};
use std::fmt;

/// Content address of a block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Deterministic synthetic hash for `height` (SHA-256 of the big-endian height).
    /// Used to build pending work when no real header chain is available.
    pub fn synthetic(height: u64) -> Self {
        let digest = Sha256::digest(height.to_be_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        write!(f, "BlockHash({}..)", &hex::encode(&self.0[..4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_hashes_are_distinct_and_stable() {
        assert_eq!(BlockHash::synthetic(7), BlockHash::synthetic(7));
        assert_ne!(BlockHash::synthetic(7), BlockHash::synthetic(8));
    }

    #[test]
    fn hex_display_parses_back() {
        let h = BlockHash::synthetic(42);
        let s = h.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(BlockHash::from_hex(&s), Some(h));
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(BlockHash::from_hex("abcd").is_none());
        assert!(BlockHash::from_hex("zz").is_none());
    }
}
