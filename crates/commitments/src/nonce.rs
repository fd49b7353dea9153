//! Dependency nonce keys.
//!
//! The nonce registry stores one counter per key. A conditional transaction
//! only pays out while the counter under its key still reads
//! [`DependencyValue::NotUninstalled`]; uninstalling bumps it. Keys are derived
//! here exactly as the registry derives them.

use statechannel_types::abi::{encode_packed, Token};
use statechannel_types::{Address, Hash};

/// Values a dependency nonce takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DependencyValue {
    NotUninstalled = 0,
    Uninstalled = 1,
}

/// `keccak256(abi.encodePacked(address multisig, uint256 timeout, bytes32 salt))`.
pub fn uninstall_key(multisig: Address, timeout: u128, salt: &Hash) -> Hash {
    Hash::from_bytes(&encode_packed(&[
        Token::Address(multisig),
        Token::Uint(timeout),
        Token::FixedBytes(*salt),
    ]))
}

/// `keccak256(abi.encodePacked(uint256 value))`.
pub fn setup_dependency_salt(value: u128) -> Hash {
    Hash::from_bytes(&encode_packed(&[Token::Uint(value)]))
}

/// Key of the app installed with sequence number `app_seq_no` (free balance is 0).
pub fn app_uninstall_key(multisig: Address, app_seq_no: u64) -> Hash {
    uninstall_key(multisig, 0, &setup_dependency_salt(app_seq_no as u128))
}
