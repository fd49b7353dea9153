//! Domain-separated digests for signed channel messages.
//!
//! Every digest a channel participant signs starts with the single domain
//! byte `0x19`, so a channel signature can never be replayed as a plain
//! Ethereum transaction (whose RLP encoding never starts with that byte).
//!
//! | Digest | Packed fields after the prefix |
//! |--------|--------------------------------|
//! | multisig transaction | `address[] owners, address to, uint256 value, bytes data, uint8 op` |
//! | app state update | `bytes32 identity_hash, uint256 nonce, uint256 timeout, bytes32 state_hash` |
//!
//! The field layout must match the contracts byte for byte; the contract
//! rebuilds the same digest and recovers the signers from it.

use crate::abi::{encode_packed, Token};
use crate::{Address, Hash, Operation};

/// Domain-separation prefix byte.
pub const DOMAIN_PREFIX: u8 = 0x19;

/// Keccak-256 of `0x19 || encodePacked(fields)`.
pub fn digest(fields: &[Token]) -> Hash {
    let mut message = vec![DOMAIN_PREFIX];
    message.extend(encode_packed(fields));
    Hash::from_bytes(&message)
}

/// Digest of a transaction the multisig will execute once all owners sign.
pub fn multisig_transaction_digest(
    owners: &[Address],
    to: Address,
    value: u128,
    data: &[u8],
    operation: Operation,
) -> Hash {
    digest(&[
        Token::Array(owners.iter().copied().map(Token::Address).collect()),
        Token::Address(to),
        Token::Uint(value),
        Token::Bytes(data.to_vec()),
        Token::Uint8(operation as u8),
    ])
}

/// Digest of an app state update submitted to the app registry.
pub fn set_state_digest(
    identity_hash: &Hash,
    nonce: u128,
    timeout: u128,
    state_hash: &Hash,
) -> Hash {
    digest(&[
        Token::FixedBytes(*identity_hash),
        Token::Uint(nonce),
        Token::Uint(timeout),
        Token::FixedBytes(*state_hash),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_prepends_domain_byte() {
        let fields = [Token::Uint8(7)];
        assert_eq!(digest(&fields), Hash::from_bytes(&[0x19, 7]));
    }

    #[test]
    fn test_set_state_digest_depends_on_every_field() {
        let id = Hash::from_bytes(b"app");
        let state = Hash::from_bytes(b"state");
        let base = set_state_digest(&id, 1, 10, &state);

        assert_ne!(base, set_state_digest(&Hash::from_bytes(b"other"), 1, 10, &state));
        assert_ne!(base, set_state_digest(&id, 2, 10, &state));
        assert_ne!(base, set_state_digest(&id, 1, 11, &state));
        assert_ne!(base, set_state_digest(&id, 1, 10, &Hash::from_bytes(b"s2")));
    }

    #[test]
    fn test_multisig_digest_distinguishes_operation() {
        let owners = [Address::from_raw([1; 20]), Address::from_raw([2; 20])];
        let to = Address::from_raw([3; 20]);
        let call = multisig_transaction_digest(&owners, to, 0, b"data", Operation::Call);
        let delegate = multisig_transaction_digest(&owners, to, 0, b"data", Operation::DelegateCall);
        assert_ne!(call, delegate);
    }

    #[test]
    fn test_multisig_digest_layout() {
        let owner = Address::from_raw([1; 20]);
        let to = Address::from_raw([3; 20]);

        let mut expected = vec![0x19];
        expected.extend_from_slice(&owner.to_word());
        expected.extend_from_slice(to.as_bytes());
        expected.extend_from_slice(&[0u8; 31]);
        expected.push(5);
        expected.extend_from_slice(&[0xde, 0xad]);
        expected.push(1);

        assert_eq!(
            multisig_transaction_digest(&[owner], to, 5, &[0xde, 0xad], Operation::DelegateCall),
            Hash::from_bytes(&expected)
        );
    }
}
