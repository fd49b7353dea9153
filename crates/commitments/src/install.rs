//! App installation.

use crate::multisend::multisend_transaction;
use crate::multisig::{check_owners, exec_transaction, multisig_digest};
use crate::nonce::{app_uninstall_key, DependencyValue};
use crate::set_state::FreeBalanceUpdate;
use crate::setup::conditional_transaction;
use crate::{Commitment, CommitmentError, NetworkContext};
use statechannel_types::{Address, Hash, MultisigTransaction, Signature, Terms, Transaction};

/// Installs an app: moves its allocation out of the free balance and
/// authorizes exactly one future payout for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommitment {
    ctx: NetworkContext,
    multisig: Address,
    owners: Vec<Address>,
    free_balance: FreeBalanceUpdate,
    app_identity_hash: Hash,
    terms: Terms,
    app_seq_no: u64,
}

impl InstallCommitment {
    /// `free_balance` is the state after the allocation has been deducted.
    /// `app_seq_no` must be greater than 0, which belongs to the free balance.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: NetworkContext,
        multisig: Address,
        owners: Vec<Address>,
        free_balance: FreeBalanceUpdate,
        app_identity_hash: Hash,
        terms: Terms,
        app_seq_no: u64,
    ) -> Result<Self, CommitmentError> {
        check_owners(&owners)?;
        if app_seq_no == 0 {
            return Err(CommitmentError::Malformed("app sequence number 0 is the free balance"));
        }
        Ok(Self {
            ctx,
            multisig,
            owners,
            free_balance,
            app_identity_hash,
            terms,
            app_seq_no,
        })
    }

    /// Uninstall key guarding the new app's payout.
    pub fn uninstall_key(&self) -> Hash {
        app_uninstall_key(self.multisig, self.app_seq_no)
    }

    /// Inner multisend call the multisig executes.
    pub fn multisig_transaction(&self) -> MultisigTransaction {
        multisend_transaction(
            &self.ctx,
            &[
                self.free_balance.to_multisig_transaction(&self.ctx),
                conditional_transaction(
                    &self.ctx,
                    &self.uninstall_key(),
                    DependencyValue::NotUninstalled as u128,
                    &self.app_identity_hash,
                    &self.terms,
                ),
            ],
        )
    }
}

impl Commitment for InstallCommitment {
    fn hash_to_sign(&self) -> Hash {
        multisig_digest(&self.owners, &self.multisig_transaction())
    }

    fn to_transaction(&self, signatures: &[Signature]) -> Result<Transaction, CommitmentError> {
        exec_transaction(self.multisig, &self.owners, &self.multisig_transaction(), signatures)
    }
}
