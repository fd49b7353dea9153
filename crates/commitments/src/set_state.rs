//! App state updates submitted to the app registry.

use crate::validator::{signatures_to_bytes, sort_signatures_by_signer};
use crate::{Commitment, CommitmentError, NetworkContext};
use statechannel_ledger::FreeBalanceState;
use statechannel_types::abi::{encode_call, Token};
use statechannel_types::signing::set_state_digest;
use statechannel_types::{AppIdentity, Hash, MultisigTransaction, Operation, Signature, Transaction};

const SET_STATE: &str =
    "setState((address,address[],address,bytes32,uint256),(bytes32,uint256,uint256,bytes))";

/// Signature field used when the multisig itself submits the update.
///
/// The registry accepts updates from the app owner without checking signatures.
const OWNER_SUBMITTED_SIGNATURES: [u8; 32] = [0u8; 32];

fn set_state_call(
    identity: &AppIdentity,
    state_hash: &Hash,
    nonce: u64,
    timeout: u64,
    signatures: Vec<u8>,
) -> Vec<u8> {
    encode_call(
        SET_STATE,
        &[
            identity.to_token(),
            Token::Tuple(vec![
                Token::FixedBytes(*state_hash),
                Token::Uint(nonce as u128),
                Token::Uint(timeout as u128),
                Token::Bytes(signatures),
            ]),
        ],
    )
}

/// A signed app state update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetStateCommitment {
    ctx: NetworkContext,
    app_identity: AppIdentity,
    app_state_hash: Hash,
    nonce: u64,
    timeout: u64,
}

impl SetStateCommitment {
    pub fn new(
        ctx: NetworkContext,
        app_identity: AppIdentity,
        app_state_hash: Hash,
        nonce: u64,
        timeout: u64,
    ) -> Self {
        Self {
            ctx,
            app_identity,
            app_state_hash,
            nonce,
            timeout,
        }
    }

    pub fn app_identity(&self) -> &AppIdentity {
        &self.app_identity
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

impl Commitment for SetStateCommitment {
    fn hash_to_sign(&self) -> Hash {
        set_state_digest(
            &self.app_identity.hash(),
            self.nonce as u128,
            self.timeout as u128,
            &self.app_state_hash,
        )
    }

    fn to_transaction(&self, signatures: &[Signature]) -> Result<Transaction, CommitmentError> {
        let expected = self.app_identity.signing_keys.len();
        if signatures.len() != expected {
            return Err(CommitmentError::SignatureCount {
                expected,
                actual: signatures.len(),
            });
        }
        let sorted = sort_signatures_by_signer(&self.hash_to_sign(), signatures)?;

        Ok(Transaction {
            to: self.ctx.app_registry,
            value: 0,
            data: set_state_call(
                &self.app_identity,
                &self.app_state_hash,
                self.nonce,
                self.timeout,
                signatures_to_bytes(&sorted),
            ),
        })
    }
}

/// New free-balance state to write as part of a multisig transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBalanceUpdate {
    pub identity: AppIdentity,
    pub state: FreeBalanceState,
    pub nonce: u64,
    pub timeout: u64,
}

impl FreeBalanceUpdate {
    /// Registry call the multisig makes to store the new free balance.
    pub(crate) fn to_multisig_transaction(&self, ctx: &NetworkContext) -> MultisigTransaction {
        MultisigTransaction {
            to: ctx.app_registry,
            value: 0,
            data: set_state_call(
                &self.identity,
                &self.state.hash(),
                self.nonce,
                self.timeout,
                OWNER_SUBMITTED_SIGNATURES.to_vec(),
            ),
            operation: Operation::Call,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statechannel_test_helpers::{test_app_identity, test_keypair};
    use statechannel_types::abi::{decode_call, ParamType};
    use statechannel_types::Address;

    fn identity() -> AppIdentity {
        test_app_identity(
            Address::from_raw([9; 20]),
            &[test_keypair(1).address(), test_keypair(2).address()],
        )
    }

    fn commitment() -> SetStateCommitment {
        SetStateCommitment::new(
            NetworkContext::for_testing(),
            identity(),
            Hash::from_bytes(b"state"),
            3,
            100,
        )
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(commitment().hash_to_sign(), commitment().hash_to_sign());
    }

    #[test]
    fn test_digest_covers_every_field() {
        let base = commitment().hash_to_sign();
        let ctx = NetworkContext::for_testing();
        let state = Hash::from_bytes(b"state");

        let mut other_identity = identity();
        other_identity.default_timeout += 1;

        let variants = [
            SetStateCommitment::new(ctx.clone(), other_identity, state, 3, 100),
            SetStateCommitment::new(ctx.clone(), identity(), Hash::from_bytes(b"s2"), 3, 100),
            SetStateCommitment::new(ctx.clone(), identity(), state, 4, 100),
            SetStateCommitment::new(ctx, identity(), state, 3, 101),
        ];
        for variant in variants {
            assert_ne!(variant.hash_to_sign(), base);
        }
    }

    #[test]
    fn test_transaction_targets_registry() {
        let c = commitment();
        let digest = c.hash_to_sign();
        let sigs = [test_keypair(2).sign_digest(&digest), test_keypair(1).sign_digest(&digest)];

        let tx = c.to_transaction(&sigs).unwrap();
        assert_eq!(tx.to, NetworkContext::for_testing().app_registry);

        let decoded = decode_call(
            SET_STATE,
            &[
                ParamType::Tuple(vec![
                    ParamType::Address,
                    ParamType::Array(Box::new(ParamType::Address)),
                    ParamType::Address,
                    ParamType::FixedBytes,
                    ParamType::Uint,
                ]),
                ParamType::Tuple(vec![
                    ParamType::FixedBytes,
                    ParamType::Uint,
                    ParamType::Uint,
                    ParamType::Bytes,
                ]),
            ],
            &tx.data,
        )
        .unwrap();
        assert_eq!(decoded[0], identity().to_token());
        match &decoded[1] {
            Token::Tuple(update) => {
                assert_eq!(update[1], Token::Uint(3));
                assert_eq!(update[3], Token::Bytes(signatures_to_bytes(
                    &sort_signatures_by_signer(&digest, &sigs).unwrap()
                )));
            }
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn test_transaction_requires_every_signing_key() {
        let c = commitment();
        let sig = test_keypair(1).sign_digest(&c.hash_to_sign());
        assert_eq!(
            c.to_transaction(&[sig]),
            Err(CommitmentError::SignatureCount {
                expected: 2,
                actual: 1
            })
        );
    }
}
