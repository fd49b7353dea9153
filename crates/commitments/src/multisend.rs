//! MultiSend batching.
//!
//! The multisend contract takes one `bytes` argument holding the sub-calls
//! back to back, each encoded as `abi.encode(uint8 op, address to, uint256
//! value, bytes data)`. The contract walks that buffer itself, so the layout
//! here must match it exactly.

use crate::{CommitmentError, NetworkContext};
use statechannel_types::abi::{decode, decode_call, encode, encode_call, ParamType, Token};
use statechannel_types::{MultisigTransaction, Operation};

const MULTI_SEND: &str = "multiSend(bytes)";

fn sub_call_types() -> [ParamType; 4] {
    [
        ParamType::Uint8,
        ParamType::Address,
        ParamType::Uint,
        ParamType::Bytes,
    ]
}

fn sub_call_tokens(tx: &MultisigTransaction) -> [Token; 4] {
    [
        Token::Uint8(tx.operation as u8),
        Token::Address(tx.to),
        Token::Uint(tx.value),
        Token::Bytes(tx.data.clone()),
    ]
}

/// Concatenated encoding of `calls`.
pub fn encode_multisend(calls: &[MultisigTransaction]) -> Vec<u8> {
    calls
        .iter()
        .flat_map(|tx| encode(&sub_call_tokens(tx)))
        .collect()
}

/// Inverse of [`encode_multisend`].
pub fn decode_multisend(mut bytes: &[u8]) -> Result<Vec<MultisigTransaction>, CommitmentError> {
    let mut calls = Vec::new();
    while !bytes.is_empty() {
        let tokens = decode(&sub_call_types(), bytes)?;
        let consumed = encode(&tokens).len();

        let tx = match tokens.as_slice() {
            [Token::Uint8(op), Token::Address(to), Token::Uint(value), Token::Bytes(data)] => {
                MultisigTransaction {
                    to: *to,
                    value: *value,
                    data: data.clone(),
                    operation: Operation::from_u8(*op)
                        .ok_or(CommitmentError::Malformed("unknown multisend operation"))?,
                }
            }
            _ => return Err(CommitmentError::Malformed("unexpected multisend entry")),
        };
        calls.push(tx);
        bytes = bytes
            .get(consumed..)
            .ok_or(CommitmentError::Malformed("multisend entry overruns buffer"))?;
    }
    Ok(calls)
}

/// Multisig transaction delegate-calling the multisend contract with `calls`.
pub fn multisend_transaction(ctx: &NetworkContext, calls: &[MultisigTransaction]) -> MultisigTransaction {
    MultisigTransaction {
        to: ctx.multi_send,
        value: 0,
        data: encode_call(MULTI_SEND, &[Token::Bytes(encode_multisend(calls))]),
        operation: Operation::DelegateCall,
    }
}

/// Recover the sub-calls from `multiSend(bytes)` calldata.
pub fn decode_multisend_call(data: &[u8]) -> Result<Vec<MultisigTransaction>, CommitmentError> {
    match decode_call(MULTI_SEND, &[ParamType::Bytes], data)?.as_slice() {
        [Token::Bytes(inner)] => decode_multisend(inner),
        _ => Err(CommitmentError::Malformed("unexpected multisend calldata")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statechannel_types::Address;

    fn calls() -> Vec<MultisigTransaction> {
        vec![
            MultisigTransaction {
                to: Address::from_raw([1; 20]),
                value: 0,
                data: vec![0xaa; 70],
                operation: Operation::Call,
            },
            MultisigTransaction {
                to: Address::from_raw([2; 20]),
                value: 12,
                data: vec![],
                operation: Operation::DelegateCall,
            },
            MultisigTransaction {
                to: Address::from_raw([3; 20]),
                value: 0,
                data: vec![0x01; 32],
                operation: Operation::Call,
            },
        ]
    }

    #[test]
    fn test_decode_inverts_encode() {
        assert_eq!(decode_multisend(&encode_multisend(&calls())).unwrap(), calls());
        assert!(decode_multisend(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_sub_call_layout() {
        let encoded = encode_multisend(&calls()[1..2]);
        // op, to, value, offset, length; empty data adds no body words
        assert_eq!(encoded.len(), 5 * 32);
        assert_eq!(encoded[31], 1);
        assert_eq!(encoded[95], 12);
        assert_eq!(encoded[127], 0x80);
    }

    #[test]
    fn test_call_wrapping() {
        let ctx = NetworkContext::for_testing();
        let tx = multisend_transaction(&ctx, &calls());
        assert_eq!(tx.to, ctx.multi_send);
        assert_eq!(tx.operation, Operation::DelegateCall);
        assert_eq!(decode_multisend_call(&tx.data).unwrap(), calls());
    }

    #[test]
    fn test_truncated_buffer_fails() {
        let encoded = encode_multisend(&calls());
        assert!(decode_multisend(&encoded[..encoded.len() - 16]).is_err());
    }

    #[test]
    fn test_unknown_operation_fails() {
        let mut encoded = encode_multisend(&calls()[..1]);
        encoded[31] = 7;
        assert_eq!(
            decode_multisend(&encoded),
            Err(CommitmentError::Malformed("unknown multisend operation"))
        );
    }

    #[test]
    fn test_huge_data_length_fails() {
        let mut encoded = encode_multisend(&calls()[1..2]);
        // length word of the data field
        encoded[152..160].copy_from_slice(&[0xff; 8]);
        assert!(matches!(
            decode_multisend(&encoded),
            Err(CommitmentError::Abi(_))
        ));
    }

    #[test]
    fn test_entry_overrunning_buffer_fails() {
        let call = MultisigTransaction {
            to: Address::from_raw([5; 20]),
            value: 0,
            data: vec![],
            operation: Operation::Call,
        };
        let mut encoded = encode_multisend(&[call]);
        // Point the data offset at the zero operation word and drop the tail.
        encoded.truncate(128);
        encoded[96..128].fill(0);
        assert_eq!(
            decode_multisend(&encoded),
            Err(CommitmentError::Malformed("multisend entry overruns buffer"))
        );
    }
}
