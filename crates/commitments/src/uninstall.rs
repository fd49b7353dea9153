//! App uninstallation.

use crate::multisend::multisend_transaction;
use crate::multisig::{check_owners, exec_transaction, multisig_digest};
use crate::nonce::{app_uninstall_key, setup_dependency_salt, DependencyValue};
use crate::set_state::FreeBalanceUpdate;
use crate::{Commitment, CommitmentError, NetworkContext};
use statechannel_types::abi::{encode_call, Token};
use statechannel_types::{Address, Hash, MultisigTransaction, Operation, Signature, Transaction};

const SET_NONCE: &str = "setNonce(uint256,bytes32,uint256)";

/// Uninstalls an app: credits its payout to the free balance and flips its
/// dependency nonce so its conditional transaction can no longer pay out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallCommitment {
    ctx: NetworkContext,
    multisig: Address,
    owners: Vec<Address>,
    free_balance: FreeBalanceUpdate,
    app_seq_no: u64,
}

impl UninstallCommitment {
    /// `free_balance` is the state after the payout has been credited.
    pub fn new(
        ctx: NetworkContext,
        multisig: Address,
        owners: Vec<Address>,
        free_balance: FreeBalanceUpdate,
        app_seq_no: u64,
    ) -> Result<Self, CommitmentError> {
        check_owners(&owners)?;
        if app_seq_no == 0 {
            return Err(CommitmentError::Malformed("the free balance cannot be uninstalled"));
        }
        Ok(Self {
            ctx,
            multisig,
            owners,
            free_balance,
            app_seq_no,
        })
    }

    /// Key whose nonce this commitment sets.
    pub fn uninstall_key(&self) -> Hash {
        app_uninstall_key(self.multisig, self.app_seq_no)
    }

    fn set_nonce(&self) -> MultisigTransaction {
        MultisigTransaction {
            to: self.ctx.nonce_registry,
            value: 0,
            data: encode_call(
                SET_NONCE,
                &[
                    Token::Uint(0),
                    Token::FixedBytes(setup_dependency_salt(self.app_seq_no as u128)),
                    Token::Uint(DependencyValue::Uninstalled as u128),
                ],
            ),
            operation: Operation::Call,
        }
    }

    /// Inner multisend call the multisig executes.
    pub fn multisig_transaction(&self) -> MultisigTransaction {
        multisend_transaction(
            &self.ctx,
            &[self.free_balance.to_multisig_transaction(&self.ctx), self.set_nonce()],
        )
    }
}

impl Commitment for UninstallCommitment {
    fn hash_to_sign(&self) -> Hash {
        multisig_digest(&self.owners, &self.multisig_transaction())
    }

    fn to_transaction(&self, signatures: &[Signature]) -> Result<Transaction, CommitmentError> {
        exec_transaction(self.multisig, &self.owners, &self.multisig_transaction(), signatures)
    }
}
