//! Commitments for channel protocol steps.
//!
//! A commitment is a value object built from everything that determines the
//! on-chain effect of one protocol step. It yields the digest every owner
//! signs and, given those signatures, the transaction that enforces the step.
//!
//! # Commitments
//!
//! | Commitment | Target | Effect |
//! |------------|--------|--------|
//! | [`SetupCommitment`] | multisig, delegate-call | conditional transaction for the free balance |
//! | [`InstallCommitment`] | multisig, multisend | free-balance update + conditional transaction for the new app |
//! | [`UninstallCommitment`] | multisig, multisend | free-balance update + dependency nonce flipped to uninstalled |
//! | [`SetStateCommitment`] | app registry | signed app state update |
//!
//! Multisig-routed commitments sign
//! `keccak256(0x19 || owners || to || value || data || op)` and wrap the
//! inner call in `execTransaction` with signatures sorted by signer.

mod context;
mod error;
mod install;
pub mod multisend;
mod multisig;
pub mod nonce;
mod set_state;
mod setup;
mod uninstall;
pub mod validator;

pub use context::NetworkContext;
pub use error::CommitmentError;
pub use install::InstallCommitment;
pub use multisend::{decode_multisend, decode_multisend_call, encode_multisend, multisend_transaction};
pub use multisig::{exec_transaction, multisig_digest};
pub use set_state::{FreeBalanceUpdate, SetStateCommitment};
pub use setup::SetupCommitment;
pub use uninstall::UninstallCommitment;
pub use validator::{signatures_to_bytes, sort_signatures_by_signer, validate_signature, SignatureError};

use statechannel_types::{Hash, Signature, Transaction};

/// A signable protocol step.
pub trait Commitment {
    /// Digest every required signer signs.
    ///
    /// Deterministic in the commitment's fields, and covers every field that
    /// changes the on-chain effect.
    fn hash_to_sign(&self) -> Hash;

    /// Transaction that enforces this step, given the owners' signatures
    /// over [`hash_to_sign`](Commitment::hash_to_sign).
    fn to_transaction(&self, signatures: &[Signature]) -> Result<Transaction, CommitmentError>;
}
