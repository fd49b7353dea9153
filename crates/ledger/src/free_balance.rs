//! The free-balance app state.

use crate::balances::{Amount, Ledger, LedgerError};
use serde::{Deserialize, Serialize};
use statechannel_types::abi::{encode, Token};
use statechannel_types::{Address, Hash};
use std::collections::HashSet;
use tracing::debug;

/// One holder's claimable amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: Address,
    pub amount: Amount,
}

fn sum(balances: &[Balance]) -> Option<Amount> {
    balances
        .iter()
        .try_fold(0 as Amount, |acc, b| acc.checked_add(b.amount))
}

/// Ordered balances of the channel's free-balance app.
///
/// Holders are fixed when the state is created and no amount is ever
/// negative; both are checked on construction and on every [`apply`].
///
/// [`apply`]: FreeBalanceState::apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBalanceState {
    balances: Vec<Balance>,
}

impl FreeBalanceState {
    /// Create a free balance from `(holder, amount)` pairs, in order.
    pub fn new(balances: impl IntoIterator<Item = (Address, Amount)>) -> Result<Self, LedgerError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (address, amount) in balances {
            if !seen.insert(address) {
                return Err(LedgerError::DuplicateHolder { address });
            }
            if amount < 0 {
                return Err(LedgerError::Underflow {
                    address,
                    balance: 0,
                    delta: amount,
                });
            }
            out.push(Balance { address, amount });
        }
        Ok(Self { balances: out })
    }

    /// Balances in holder order.
    pub fn balances(&self) -> &[Balance] {
        &self.balances
    }

    /// Amount held by `address`, if it is a holder.
    pub fn balance_of(&self, address: &Address) -> Option<Amount> {
        self.balances
            .iter()
            .find(|b| &b.address == address)
            .map(|b| b.amount)
    }

    /// Sum of all balances, `None` if it does not fit an [`Amount`].
    pub fn total(&self) -> Option<Amount> {
        sum(&self.balances)
    }

    /// Replace the amounts with those of a merged ledger.
    ///
    /// The ledger must name exactly this state's holders; order is taken
    /// from the state, not the ledger.
    pub fn apply(&self, ledger: &Ledger) -> Result<Self, LedgerError> {
        if let Some(address) = ledger
            .keys()
            .find(|k| self.balance_of(k).is_none())
        {
            return Err(LedgerError::KeyMismatch { address: *address });
        }

        let mut balances = Vec::with_capacity(self.balances.len());
        for balance in &self.balances {
            let amount = *ledger
                .get(&balance.address)
                .ok_or(LedgerError::KeyMismatch {
                    address: balance.address,
                })?;
            if amount < 0 {
                return Err(LedgerError::Underflow {
                    address: balance.address,
                    balance: balance.amount,
                    delta: amount - balance.amount,
                });
            }
            balances.push(Balance {
                address: balance.address,
                amount,
            });
        }

        debug!(
            holders = balances.len(),
            before = ?self.total(),
            after = ?sum(&balances),
            "Applied ledger to free balance"
        );
        Ok(Self { balances })
    }

    /// ABI form `(address, uint256)[]`.
    pub fn to_token(&self) -> Token {
        Token::Array(
            self.balances
                .iter()
                .map(|b| {
                    Token::Tuple(vec![
                        Token::Address(b.address),
                        // Non-negative by construction.
                        Token::Uint(b.amount as u128),
                    ])
                })
                .collect(),
        )
    }

    /// ABI-encoded state, as stored by the app registry.
    pub fn encode(&self) -> Vec<u8> {
        encode(&[self.to_token()])
    }

    /// `keccak256` of the encoded state.
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flip, from_state, merge};
    use tracing_test::traced_test;

    fn addr(byte: u8) -> Address {
        Address::from_raw([byte; 20])
    }

    fn two_party(a: Amount, b: Amount) -> FreeBalanceState {
        FreeBalanceState::new([(addr(1), a), (addr(2), b)]).unwrap()
    }

    #[test]
    fn test_rejects_duplicate_and_negative() {
        assert_eq!(
            FreeBalanceState::new([(addr(1), 1), (addr(1), 2)]),
            Err(LedgerError::DuplicateHolder { address: addr(1) })
        );
        assert!(matches!(
            FreeBalanceState::new([(addr(1), -1)]),
            Err(LedgerError::Underflow { .. })
        ));
    }

    #[test]
    fn test_install_allocation_conserves_value() {
        let state = two_party(10, 10);
        let allocation: Ledger = [(addr(1), 2), (addr(2), 3)].into_iter().collect();

        let merged = merge(&from_state(&state), &flip(&allocation).unwrap()).unwrap();
        let next = state.apply(&merged).unwrap();

        assert_eq!(next.balance_of(&addr(1)), Some(8));
        assert_eq!(next.balance_of(&addr(2)), Some(7));
        assert_eq!(next.total(), Some(15));
        assert_eq!(state.total(), Some(20));
    }

    #[test]
    fn test_apply_rejects_new_holder() {
        let state = two_party(1, 1);
        let ledger: Ledger = [(addr(1), 1), (addr(2), 1), (addr(3), 0)]
            .into_iter()
            .collect();
        assert_eq!(
            state.apply(&ledger),
            Err(LedgerError::KeyMismatch { address: addr(3) })
        );
    }

    #[test]
    fn test_apply_rejects_missing_holder() {
        let state = two_party(1, 1);
        let ledger: Ledger = [(addr(1), 1)].into_iter().collect();
        assert_eq!(
            state.apply(&ledger),
            Err(LedgerError::KeyMismatch { address: addr(2) })
        );
    }

    #[test]
    #[traced_test]
    fn test_total_past_amount_max() {
        let state = two_party(Amount::MAX, 1);
        assert_eq!(state.total(), None);

        let ledger: Ledger = [(addr(1), Amount::MAX), (addr(2), 2)].into_iter().collect();
        let next = state.apply(&ledger).unwrap();
        assert_eq!(next.balance_of(&addr(2)), Some(2));
        assert!(logs_contain("Applied ledger to free balance"));
    }

    #[test]
    fn test_hash_changes_with_amounts() {
        assert_eq!(two_party(1, 2).hash(), two_party(1, 2).hash());
        assert_ne!(two_party(1, 2).hash(), two_party(2, 1).hash());
    }

    #[test]
    fn test_encoding_layout() {
        let encoded = two_party(5, 6).encode();
        // offset, length, then two static (address, uint256) tuples
        assert_eq!(encoded.len(), 32 + 32 + 2 * 64);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63], 2);
        assert_eq!(encoded[127], 5);
    }

    #[test]
    fn test_serde_roundtrip() {
        let state = two_party(3, 4);
        let json = serde_json::to_string(&state).unwrap();
        let back: FreeBalanceState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
