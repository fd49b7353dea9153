//! Commitment errors.

use statechannel_types::{AbiError, CryptoError};

/// Errors from building or finalizing a commitment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitmentError {
    /// A constructor field is missing or inconsistent.
    #[error("Malformed commitment: {0}")]
    Malformed(&'static str),

    /// Wrong number of signatures for the owner set.
    #[error("Expected {expected} signatures, got {actual}")]
    SignatureCount {
        /// Number of owners.
        expected: usize,
        /// Number of signatures supplied.
        actual: usize,
    },

    /// A signature could not be attributed to a signer.
    #[error("Signature recovery failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Encoded payload could not be decoded.
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
}
