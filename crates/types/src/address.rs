//! Ethereum-style 20-byte account addresses.

use crate::{Hash, HexError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 20-byte account address.
///
/// Derived from a secp256k1 public key as the last 20 bytes of the Keccak-256
/// hash of the uncompressed key (without the `0x04` tag). Ordering is
/// byte-wise, which matches numeric ordering of the address on-chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Size of an address in bytes.
    pub const BYTES: usize = 20;

    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an address from raw bytes.
    pub const fn from_raw(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address of an uncompressed public key (65 bytes, `0x04` tagged).
    pub fn from_uncompressed_public_key(public_key: &[u8; 65]) -> Self {
        let digest = Hash::from_bytes(&public_key[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[12..]);
        Self(bytes)
    }

    /// Parse an address from hex, with or without a `0x` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        if hex.len() != 40 {
            return Err(HexError::InvalidLength {
                expected: 40,
                actual: hex.len(),
            });
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| HexError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// Lowercase hex form without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get bytes as slice reference.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Left-pad the address to a 32-byte ABI word.
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Address({}..{})", &hex[..6], &hex[36..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let addr = Address::from_hex("0x52908400098527886E0F7030069857D2E4169EE7").unwrap();
        assert_eq!(addr.to_string(), "0x52908400098527886e0f7030069857d2e4169ee7");
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(matches!(
            Address::from_hex("0x1234"),
            Err(HexError::InvalidLength { expected: 40, actual: 4 })
        ));
        assert_eq!(
            Address::from_hex("zz908400098527886e0f7030069857d2e4169ee7"),
            Err(HexError::InvalidHex)
        );
    }

    #[test]
    fn test_word_is_left_padded() {
        let addr = Address::from_raw([0xab; 20]);
        let word = addr.to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &[0xab; 20]);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = Address::from_raw([1; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
