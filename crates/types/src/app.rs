//! App instance identity and terms.

use crate::abi::{encode, Token};
use crate::{Address, Hash};
use serde::{Deserialize, Serialize};

/// Kind of asset an app is allowed to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssetType {
    Eth = 0,
    Erc20 = 1,
    Any = 2,
}

/// Limit on what an app may transfer out of the multisig when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Terms {
    pub asset_type: AssetType,
    pub limit: u128,
    pub token: Address,
}

impl Terms {
    /// ETH terms capped at `limit`.
    pub fn eth(limit: u128) -> Self {
        Self {
            asset_type: AssetType::Eth,
            limit,
            token: Address::ZERO,
        }
    }

    /// ABI tuple `(uint8 assetType, uint256 limit, address token)`.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Uint8(self.asset_type as u8),
            Token::Uint(self.limit),
            Token::Address(self.token),
        ])
    }

    /// `keccak256(abi.encode(assetType, limit, token))`.
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&encode(&[
            Token::Uint8(self.asset_type as u8),
            Token::Uint(self.limit),
            Token::Address(self.token),
        ]))
    }
}

/// Immutable identity of an app instance inside a channel.
///
/// `owner` is the channel's multisig; `signing_keys` are the addresses whose
/// signatures the app registry requires, in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppIdentity {
    pub owner: Address,
    pub signing_keys: Vec<Address>,
    pub app_definition: Address,
    pub terms_hash: Hash,
    pub default_timeout: u64,
}

impl AppIdentity {
    /// ABI tuple `(address, address[], address, bytes32, uint256)`.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.owner),
            Token::Array(self.signing_keys.iter().copied().map(Token::Address).collect()),
            Token::Address(self.app_definition),
            Token::FixedBytes(self.terms_hash),
            Token::Uint(self.default_timeout as u128),
        ])
    }

    /// Identifier of the app instance: `keccak256(abi.encode(identity))`.
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&encode(&[self.to_token()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> AppIdentity {
        AppIdentity {
            owner: Address::from_raw([1; 20]),
            signing_keys: vec![Address::from_raw([2; 20]), Address::from_raw([3; 20])],
            app_definition: Address::from_raw([4; 20]),
            terms_hash: Terms::eth(100).hash(),
            default_timeout: 100,
        }
    }

    #[test]
    fn test_identity_hash_is_stable() {
        assert_eq!(identity().hash(), identity().hash());
    }

    #[test]
    fn test_signing_key_order_matters() {
        let mut swapped = identity();
        swapped.signing_keys.reverse();
        assert_ne!(identity().hash(), swapped.hash());
    }

    #[test]
    fn test_identity_encoding_has_tuple_offset() {
        // Dynamic tuple: a 0x20 offset word precedes the tuple body.
        let encoded = encode(&[identity().to_token()]);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded.len(), 32 + 5 * 32 + 32 + 2 * 32);
    }

    #[test]
    fn test_terms_hash_covers_limit() {
        assert_ne!(Terms::eth(1).hash(), Terms::eth(2).hash());
    }
}
