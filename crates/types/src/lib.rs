//! Core types for the state-channel engine.
//!
//! Everything here mirrors what the on-chain contracts see: Keccak-256
//! hashes, 20-byte addresses, recoverable secp256k1 signatures and the
//! Solidity ABI used to build calldata and signed digests.

pub mod abi;
mod address;
mod app;
mod crypto;
mod hash;
mod identifiers;
pub mod signing;
mod transaction;

pub use abi::{AbiError, ParamType, Token};
pub use address::Address;
pub use app::{AppIdentity, AssetType, Terms};
pub use crypto::{CryptoError, KeyPair, Signature};
pub use hash::{Hash, HexError};
pub use identifiers::{ShardKey, StateNonce};
pub use transaction::{MultisigTransaction, Operation, Transaction};
