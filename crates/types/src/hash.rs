//! Keccak-256 digests.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Keccak-256 output, or any other 32-byte word such as a state hash.
///
/// Text form is `0x`-prefixed lowercase hex, which is also the serde form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Keccak-256 of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Keccak256::digest(bytes).into())
    }

    /// Keccak-256 of the concatenation of `parts`.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        let mut keccak = Keccak256::new();
        for part in parts {
            keccak.update(part);
        }
        Self(keccak.finalize().into())
    }

    /// Wrap a word that is already a digest.
    pub const fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex digits, optionally `0x`-prefixed.
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != 64 {
            return Err(HexError::InvalidLength {
                expected: 64,
                actual: digits.len(),
            });
        }
        let mut word = [0u8; 32];
        hex::decode_to_slice(digits, &mut word).map_err(|_| HexError::InvalidHex)?;
        Ok(Self(word))
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.to_hex();
        write!(f, "Hash(0x{}..{})", &digits[..8], &digits[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Hash::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Failure parsing a hex-encoded hash or address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Wrong number of hex digits after the optional `0x`.
    #[error("Expected {expected} hex digits, got {actual}")]
    InvalidLength {
        /// Digits required.
        expected: usize,
        /// Digits supplied.
        actual: usize,
    },

    /// A character outside `[0-9a-fA-F]`.
    #[error("Invalid hex digit")]
    InvalidHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_of_empty_input() {
        assert_eq!(
            Hash::from_bytes(&[]).to_hex(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_parts_hash_like_concatenation() {
        assert_eq!(
            Hash::from_parts(&[b"state", b"channel"]),
            Hash::from_bytes(b"statechannel")
        );
    }

    #[test]
    fn test_hex_parsing() {
        let hash = Hash::from_bytes(b"app state");
        assert_eq!(Hash::from_hex(&hash.to_string()).unwrap(), hash);
        assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);
        assert!(matches!(
            Hash::from_hex("0x1234"),
            Err(HexError::InvalidLength {
                expected: 64,
                actual: 4
            })
        ));
        assert_eq!(Hash::from_hex(&"zz".repeat(32)), Err(HexError::InvalidHex));
    }

    #[test]
    fn test_serde_as_prefixed_hex() {
        let hash = Hash::from_raw([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
        assert_eq!(serde_json::from_str::<Hash>(&json).unwrap(), hash);
        assert!(Hash::ZERO.is_zero());
        assert!(!hash.is_zero());
    }
}
