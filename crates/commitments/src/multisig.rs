//! Transactions routed through the channel multisig.

use crate::validator::{signatures_to_bytes, sort_signatures_by_signer};
use crate::CommitmentError;
use statechannel_types::abi::{encode_call, Token};
use statechannel_types::signing::multisig_transaction_digest;
use statechannel_types::{Address, Hash, MultisigTransaction, Signature, Transaction};

const EXEC_TRANSACTION: &str = "execTransaction(address,uint256,bytes,uint8,bytes)";

/// Digest the owners sign to authorize `tx`.
pub fn multisig_digest(owners: &[Address], tx: &MultisigTransaction) -> Hash {
    multisig_transaction_digest(owners, tx.to, tx.value, &tx.data, tx.operation)
}

/// Wrap `tx` in an `execTransaction` call on the multisig.
///
/// Needs exactly one signature per owner; they are reordered by signer.
pub fn exec_transaction(
    multisig: Address,
    owners: &[Address],
    tx: &MultisigTransaction,
    signatures: &[Signature],
) -> Result<Transaction, CommitmentError> {
    if signatures.len() != owners.len() {
        return Err(CommitmentError::SignatureCount {
            expected: owners.len(),
            actual: signatures.len(),
        });
    }

    let digest = multisig_digest(owners, tx);
    let sorted = sort_signatures_by_signer(&digest, signatures)?;

    let data = encode_call(
        EXEC_TRANSACTION,
        &[
            Token::Address(tx.to),
            Token::Uint(tx.value),
            Token::Bytes(tx.data.clone()),
            Token::Uint8(tx.operation as u8),
            Token::Bytes(signatures_to_bytes(&sorted)),
        ],
    );

    Ok(Transaction {
        to: multisig,
        value: 0,
        data,
    })
}

pub(crate) fn check_owners(owners: &[Address]) -> Result<(), CommitmentError> {
    if owners.is_empty() {
        return Err(CommitmentError::Malformed("multisig has no owners"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use statechannel_test_helpers::test_keypair;
    use statechannel_types::abi::{decode_call, ParamType};
    use statechannel_types::Operation;

    fn tx() -> MultisigTransaction {
        MultisigTransaction {
            to: Address::from_raw([5; 20]),
            value: 0,
            data: vec![1, 2, 3],
            operation: Operation::DelegateCall,
        }
    }

    #[test]
    fn test_exec_transaction_sorts_signatures() {
        let keys = [test_keypair(1), test_keypair(2)];
        let owners: Vec<_> = keys.iter().map(|k| k.address()).collect();
        let digest = multisig_digest(&owners, &tx());
        let sigs: Vec<_> = keys.iter().map(|k| k.sign_digest(&digest)).collect();
        let reversed: Vec<_> = sigs.iter().rev().copied().collect();

        let multisig = Address::from_raw([9; 20]);
        let a = exec_transaction(multisig, &owners, &tx(), &sigs).unwrap();
        let b = exec_transaction(multisig, &owners, &tx(), &reversed).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.to, multisig);

        let decoded = decode_call(
            EXEC_TRANSACTION,
            &[
                ParamType::Address,
                ParamType::Uint,
                ParamType::Bytes,
                ParamType::Uint8,
                ParamType::Bytes,
            ],
            &a.data,
        )
        .unwrap();
        assert_eq!(decoded[0], Token::Address(tx().to));
        assert_eq!(decoded[3], Token::Uint8(1));
    }

    #[test]
    fn test_exec_transaction_requires_all_owners() {
        let owners = [test_keypair(1).address(), test_keypair(2).address()];
        let sig = test_keypair(1).sign_digest(&multisig_digest(&owners, &tx()));
        assert_eq!(
            exec_transaction(Address::ZERO, &owners, &tx(), &[sig]),
            Err(CommitmentError::SignatureCount {
                expected: 2,
                actual: 1
            })
        );
    }
}
