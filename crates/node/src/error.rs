//! Engine errors.

use crate::services::{SignerError, StoreError};
use statechannel_commitments::{CommitmentError, SignatureError};
use statechannel_ledger::{Amount, LedgerError};
use statechannel_lock::LockError;
use statechannel_types::{Address, Hash, StateNonce};

/// Everything a protocol method can fail with.
///
/// Each variant carries the addresses, digests or amounts needed to
/// diagnose the failure without re-deriving channel state.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Waiting for a shard lock failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Ledger arithmetic failed; nothing was applied.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A counterparty signature was missing or wrong.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// A commitment could not be built or finalized.
    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    /// No channel exists at this multisig.
    #[error("No channel at multisig {0}")]
    ChannelNotFound(Address),

    /// A channel already exists at this multisig.
    #[error("Channel at multisig {0} already exists")]
    ChannelExists(Address),

    /// No app with this identity hash is installed.
    #[error("No app instance {app_id} in channel {multisig}")]
    AppNotFound {
        /// Channel multisig.
        multisig: Address,
        /// App identity hash.
        app_id: Hash,
    },

    /// An app with this identity hash is already installed.
    #[error("App instance {0} is already installed")]
    AppExists(Hash),

    /// An install with this app id is already proposed.
    #[error("Install of app {0} is already proposed")]
    ProposalExists(Hash),

    /// No install with this app id is proposed in the channel.
    #[error("No proposed install {app_id} in channel {multisig}")]
    ProposalNotFound {
        /// Channel multisig.
        multisig: Address,
        /// Proposed app identity hash.
        app_id: Hash,
    },

    /// A state update does not advance the app's nonce.
    #[error("Stale nonce for app {app_id}: latest {latest}, proposed {proposed}")]
    StaleNonce {
        /// App identity hash.
        app_id: Hash,
        /// Latest accepted nonce.
        latest: StateNonce,
        /// Nonce that was proposed.
        proposed: StateNonce,
    },

    /// An install allocation has a negative entry.
    #[error("Negative allocation {amount} for {address}")]
    InvalidAllocation {
        /// Holder with the negative entry.
        address: Address,
        /// The amount.
        amount: Amount,
    },

    /// An install allocation exceeds the app's terms.
    #[error("Allocation {requested} exceeds terms limit {limit}")]
    TermsExceeded {
        /// Limit from the terms.
        limit: u128,
        /// Total allocation.
        requested: Amount,
    },

    /// An uninstall payout does not return exactly what was allocated.
    #[error("Payout total {actual} does not match allocated {expected}")]
    PayoutMismatch {
        /// Total allocated at install.
        expected: Amount,
        /// Total of the proposed payout.
        actual: Amount,
    },

    /// The local signer is not an owner of the channel.
    #[error("Local signer {0} is not a channel owner")]
    NotAnOwner(Address),

    /// Persisting channel state failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A channel snapshot could not be encoded or decoded.
    #[error("Invalid channel snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Local signing failed.
    #[error(transparent)]
    Signer(#[from] SignerError),
}
