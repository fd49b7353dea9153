//! Transactions produced by commitments.

use crate::Address;
use serde::{Deserialize, Serialize};

/// How the multisig invokes its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Operation {
    /// Regular call; the target runs in its own context.
    Call = 0,
    /// Delegate call; the target's code runs in the multisig's context.
    DelegateCall = 1,
}

impl Operation {
    /// Parse the on-chain `uint8` operation code.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Operation::Call),
            1 => Some(Operation::DelegateCall),
            _ => None,
        }
    }
}

/// A call the multisig makes once every owner has signed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigTransaction {
    pub to: Address,
    pub value: u128,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    pub operation: Operation,
}

/// A ready-to-broadcast transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub to: Address,
    pub value: u128,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_codes() {
        assert_eq!(Operation::Call as u8, 0);
        assert_eq!(Operation::DelegateCall as u8, 1);
        assert_eq!(Operation::from_u8(1), Some(Operation::DelegateCall));
        assert_eq!(Operation::from_u8(2), None);
    }
}
