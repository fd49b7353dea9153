//! Channel setup.

use crate::multisig::{check_owners, exec_transaction, multisig_digest};
use crate::nonce::{app_uninstall_key, DependencyValue};
use crate::{Commitment, CommitmentError, NetworkContext};
use statechannel_types::abi::{encode_call, Token};
use statechannel_types::{Address, Hash, MultisigTransaction, Operation, Signature, Terms, Transaction};

const EXECUTE_CONDITIONAL: &str =
    "executeAppConditionalTransaction(address,address,bytes32,uint256,bytes32,(uint8,uint256,address))";

/// Delegate-call into the conditional transaction contract.
///
/// Pays out according to the app's final state as long as the dependency
/// nonce under `uninstall_key` still equals `root_nonce_value`.
pub(crate) fn conditional_transaction(
    ctx: &NetworkContext,
    uninstall_key: &Hash,
    root_nonce_value: u128,
    app_identity_hash: &Hash,
    terms: &Terms,
) -> MultisigTransaction {
    MultisigTransaction {
        to: ctx.state_channel_transaction,
        value: 0,
        data: encode_call(
            EXECUTE_CONDITIONAL,
            &[
                Token::Address(ctx.app_registry),
                Token::Address(ctx.nonce_registry),
                Token::FixedBytes(*uninstall_key),
                Token::Uint(root_nonce_value),
                Token::FixedBytes(*app_identity_hash),
                terms.to_token(),
            ],
        ),
        operation: Operation::DelegateCall,
    }
}

/// The first commitment of a channel: lets the free balance settle on-chain.
///
/// The free balance is app sequence number 0 and its dependency nonce is
/// expected to still read "not uninstalled".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupCommitment {
    ctx: NetworkContext,
    multisig: Address,
    owners: Vec<Address>,
}

impl SetupCommitment {
    pub fn new(ctx: NetworkContext, multisig: Address, owners: Vec<Address>) -> Result<Self, CommitmentError> {
        check_owners(&owners)?;
        Ok(Self {
            ctx,
            multisig,
            owners,
        })
    }

    /// Inner call the multisig executes.
    pub fn multisig_transaction(&self) -> MultisigTransaction {
        let identity = self.ctx.free_balance_identity(self.multisig, &self.owners);
        conditional_transaction(
            &self.ctx,
            &app_uninstall_key(self.multisig, 0),
            DependencyValue::NotUninstalled as u128,
            &identity.hash(),
            &self.ctx.free_balance_terms(),
        )
    }
}

impl Commitment for SetupCommitment {
    fn hash_to_sign(&self) -> Hash {
        multisig_digest(&self.owners, &self.multisig_transaction())
    }

    fn to_transaction(&self, signatures: &[Signature]) -> Result<Transaction, CommitmentError> {
        exec_transaction(self.multisig, &self.owners, &self.multisig_transaction(), signatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statechannel_test_helpers::test_keypair;
    use statechannel_types::abi::{decode_call, ParamType};

    fn owners() -> Vec<Address> {
        vec![test_keypair(1).address(), test_keypair(2).address()]
    }

    #[test]
    fn test_rejects_empty_owner_set() {
        assert_eq!(
            SetupCommitment::new(NetworkContext::for_testing(), Address::ZERO, vec![]),
            Err(CommitmentError::Malformed("multisig has no owners"))
        );
    }

    #[test]
    fn test_conditional_transaction_fields() {
        let ctx = NetworkContext::for_testing();
        let multisig = Address::from_raw([9; 20]);
        let commitment = SetupCommitment::new(ctx.clone(), multisig, owners()).unwrap();
        let inner = commitment.multisig_transaction();

        assert_eq!(inner.to, ctx.state_channel_transaction);
        assert_eq!(inner.operation, Operation::DelegateCall);

        let args = decode_call(
            EXECUTE_CONDITIONAL,
            &[
                ParamType::Address,
                ParamType::Address,
                ParamType::FixedBytes,
                ParamType::Uint,
                ParamType::FixedBytes,
                ParamType::Tuple(vec![ParamType::Uint8, ParamType::Uint, ParamType::Address]),
            ],
            &inner.data,
        )
        .unwrap();

        assert_eq!(args[0], Token::Address(ctx.app_registry));
        assert_eq!(args[1], Token::Address(ctx.nonce_registry));
        assert_eq!(args[2], Token::FixedBytes(app_uninstall_key(multisig, 0)));
        assert_eq!(args[3], Token::Uint(0));
        assert_eq!(
            args[4],
            Token::FixedBytes(ctx.free_balance_identity(multisig, &owners()).hash())
        );
        assert_eq!(args[5], ctx.free_balance_terms().to_token());
    }

    #[test]
    fn test_digest_depends_on_multisig_and_owners() {
        let ctx = NetworkContext::for_testing();
        let a = SetupCommitment::new(ctx.clone(), Address::from_raw([1; 20]), owners()).unwrap();
        let b = SetupCommitment::new(ctx.clone(), Address::from_raw([2; 20]), owners()).unwrap();
        let c = SetupCommitment::new(ctx, Address::from_raw([1; 20]), vec![test_keypair(3).address()]).unwrap();

        assert_ne!(a.hash_to_sign(), b.hash_to_sign());
        assert_ne!(a.hash_to_sign(), c.hash_to_sign());
    }

    #[test]
    fn test_transaction_is_exec_on_multisig() {
        let multisig = Address::from_raw([9; 20]);
        let commitment = SetupCommitment::new(NetworkContext::for_testing(), multisig, owners()).unwrap();
        let digest = commitment.hash_to_sign();
        let sigs = [test_keypair(1).sign_digest(&digest), test_keypair(2).sign_digest(&digest)];

        let tx = commitment.to_transaction(&sigs).unwrap();
        assert_eq!(tx.to, multisig);
        assert_eq!(tx.value, 0);
    }
}
