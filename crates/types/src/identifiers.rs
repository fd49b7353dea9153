//! Domain-specific identifier types.

use crate::{Address, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key under which operations are serialized.
///
/// Operations that share any shard key never run concurrently. A channel's
/// multisig address and an app instance's identity hash are the two kinds of
/// key in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardKey(pub String);

impl ShardKey {
    /// Borrow the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Address> for ShardKey {
    fn from(address: Address) -> Self {
        ShardKey(address.to_string())
    }
}

impl From<Hash> for ShardKey {
    fn from(hash: Hash) -> Self {
        ShardKey(hash.to_string())
    }
}

impl From<&str> for ShardKey {
    fn from(s: &str) -> Self {
        ShardKey(s.to_string())
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotone version of an app's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateNonce(pub u64);

impl StateNonce {
    /// Nonce of freshly installed state.
    pub const INITIAL: Self = StateNonce(0);

    /// Get the next nonce.
    pub fn next(self) -> Self {
        StateNonce(self.0 + 1)
    }
}

impl fmt::Display for StateNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_key_from_address_is_hex() {
        let key = ShardKey::from(Address::from_raw([0xab; 20]));
        assert_eq!(key.as_str(), format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn test_nonce_next() {
        assert_eq!(StateNonce::INITIAL.next(), StateNonce(1));
        assert!(StateNonce(2) > StateNonce(1));
    }
}
