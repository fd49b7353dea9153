//! Signature validation against commitments.

use crate::Commitment;
use statechannel_types::{Address, CryptoError, Hash, Signature};
use tracing::warn;

/// Why a signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The signature is valid but was produced by someone else.
    #[error("Signature mismatch: expected signer {expected}, recovered {recovered} for digest {digest}")]
    SignatureMismatch {
        /// Address that should have signed.
        expected: Address,
        /// Address that actually signed.
        recovered: Address,
        /// Digest the signature was checked against.
        digest: Hash,
    },

    /// No signer can be recovered from the signature bytes.
    #[error("Unrecoverable signature for digest {digest}: {source}")]
    Unrecoverable {
        /// Digest the signature was checked against.
        digest: Hash,
        /// Underlying recovery failure.
        source: CryptoError,
    },

    /// The commitment or the signature was not supplied.
    #[error("Undefined input: {0}")]
    UndefinedInput(&'static str),
}

/// Check that `signature` over `commitment.hash_to_sign()` was made by `expected`.
pub fn validate_signature(
    expected: Address,
    commitment: Option<&dyn Commitment>,
    signature: Option<&Signature>,
) -> Result<(), SignatureError> {
    let commitment = commitment.ok_or(SignatureError::UndefinedInput("commitment"))?;
    let signature = signature.ok_or(SignatureError::UndefinedInput("signature"))?;

    let digest = commitment.hash_to_sign();
    let recovered = signature
        .recover(&digest)
        .map_err(|source| SignatureError::Unrecoverable { digest, source })?;

    if recovered != expected {
        warn!(%expected, %recovered, %digest, "Rejected signature from unexpected signer");
        return Err(SignatureError::SignatureMismatch {
            expected,
            recovered,
            digest,
        });
    }
    Ok(())
}

/// Order signatures by ascending recovered signer, as the contracts require.
pub fn sort_signatures_by_signer(
    digest: &Hash,
    signatures: &[Signature],
) -> Result<Vec<Signature>, CryptoError> {
    let mut keyed = signatures
        .iter()
        .map(|sig| Ok((sig.recover(digest)?, *sig)))
        .collect::<Result<Vec<_>, CryptoError>>()?;
    keyed.sort_by_key(|(signer, _)| *signer);
    Ok(keyed.into_iter().map(|(_, sig)| sig).collect())
}

/// Concatenate signatures as `r || s || v` triples.
pub fn signatures_to_bytes(signatures: &[Signature]) -> Vec<u8> {
    signatures
        .iter()
        .flat_map(|sig| sig.as_bytes().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommitmentError, SetStateCommitment};
    use statechannel_test_helpers::{test_app_identity, test_keypair};
    use statechannel_types::{Address, Transaction};

    fn commitment(nonce: u64) -> SetStateCommitment {
        SetStateCommitment::new(
            crate::NetworkContext::for_testing(),
            test_app_identity(Address::from_raw([9; 20]), &[test_keypair(1).address(), test_keypair(2).address()]),
            Hash::from_bytes(b"state"),
            nonce,
            10,
        )
    }

    #[test]
    fn test_valid_signature_passes() {
        let signer = test_keypair(1);
        let commitment = commitment(1);
        let signature = signer.sign_digest(&commitment.hash_to_sign());

        validate_signature(signer.address(), Some(&commitment), Some(&signature)).unwrap();
    }

    #[test]
    fn test_signature_over_other_digest_is_mismatch() {
        let signer = test_keypair(1);
        let signed = commitment(1);
        let checked = commitment(2);
        let signature = signer.sign_digest(&signed.hash_to_sign());

        let err = validate_signature(signer.address(), Some(&checked), Some(&signature)).unwrap_err();
        match err {
            SignatureError::SignatureMismatch {
                expected,
                recovered,
                digest,
            } => {
                assert_eq!(expected, signer.address());
                assert_ne!(recovered, expected);
                assert_eq!(digest, checked.hash_to_sign());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_signer_is_mismatch() {
        let commitment = commitment(1);
        let signature = test_keypair(2).sign_digest(&commitment.hash_to_sign());

        assert_eq!(
            validate_signature(test_keypair(1).address(), Some(&commitment), Some(&signature)),
            Err(SignatureError::SignatureMismatch {
                expected: test_keypair(1).address(),
                recovered: test_keypair(2).address(),
                digest: commitment.hash_to_sign(),
            })
        );
    }

    #[test]
    fn test_missing_inputs() {
        let commitment = commitment(1);
        let signature = test_keypair(1).sign_digest(&commitment.hash_to_sign());
        let addr = test_keypair(1).address();

        assert_eq!(
            validate_signature(addr, None, Some(&signature)),
            Err(SignatureError::UndefinedInput("commitment"))
        );
        assert_eq!(
            validate_signature(addr, Some(&commitment), None),
            Err(SignatureError::UndefinedInput("signature"))
        );
    }

    #[test]
    fn test_works_with_any_commitment() {
        struct Fixed(Hash);
        impl Commitment for Fixed {
            fn hash_to_sign(&self) -> Hash {
                self.0
            }
            fn to_transaction(&self, _: &[Signature]) -> Result<Transaction, CommitmentError> {
                Err(CommitmentError::Malformed("unused"))
            }
        }

        let fixed = Fixed(Hash::from_bytes(b"anything"));
        let signer = test_keypair(4);
        let signature = signer.sign_digest(&fixed.0);
        validate_signature(signer.address(), Some(&fixed), Some(&signature)).unwrap();
    }

    #[test]
    fn test_sort_by_signer() {
        let digest = Hash::from_bytes(b"digest");
        let keys: Vec<_> = (1..=4).map(test_keypair).collect();
        let signatures: Vec<_> = keys.iter().map(|k| k.sign_digest(&digest)).collect();

        let sorted = sort_signatures_by_signer(&digest, &signatures).unwrap();
        let signers: Vec<_> = sorted.iter().map(|s| s.recover(&digest).unwrap()).collect();

        let mut expected: Vec<_> = keys.iter().map(|k| k.address()).collect();
        expected.sort();
        assert_eq!(signers, expected);
        assert_eq!(signatures_to_bytes(&sorted).len(), 4 * 65);
    }
}
