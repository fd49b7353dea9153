//! Address to amount ledgers and the pure operations over them.

use crate::FreeBalanceState;
use indexmap::IndexMap;
use statechannel_types::Address;

/// Signed amount; increments may be negative.
pub type Amount = i128;

/// Ordered map of holder to amount. Iteration follows insertion order, which
/// for ledgers derived from a free balance is the channel's holder order.
pub type Ledger = IndexMap<Address, Amount>;

/// Errors from ledger arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A merged balance would drop below zero.
    #[error("Balance underflow for {address}: {balance} + {delta} < 0")]
    Underflow {
        /// Holder whose balance would go negative.
        address: Address,
        /// Balance before the merge.
        balance: Amount,
        /// Increment that was applied.
        delta: Amount,
    },

    /// Increments name a holder that is not in the base ledger.
    #[error("Unknown balance holder {address}")]
    KeyMismatch {
        /// The unknown holder.
        address: Address,
    },

    /// A merged balance does not fit the amount type.
    #[error("Balance overflow for {address}")]
    Overflow {
        /// Holder whose balance overflowed.
        address: Address,
    },

    /// The same holder appears twice in a free balance.
    #[error("Duplicate balance holder {address}")]
    DuplicateHolder {
        /// The repeated holder.
        address: Address,
    },
}

/// Project a free balance into a ledger, keeping holder order.
pub fn from_state(state: &FreeBalanceState) -> Ledger {
    state
        .balances()
        .iter()
        .map(|balance| (balance.address, balance.amount))
        .collect()
}

/// Negate every amount.
///
/// Fails with [`LedgerError::Overflow`] on `Amount::MIN`, which has no
/// negation; every ledger `flip` accepts satisfies `flip(flip(x)) == x`.
pub fn flip(ledger: &Ledger) -> Result<Ledger, LedgerError> {
    ledger
        .iter()
        .map(|(address, amount)| {
            amount
                .checked_neg()
                .map(|negated| (*address, negated))
                .ok_or(LedgerError::Overflow { address: *address })
        })
        .collect()
}

/// Apply `increments` to `base`.
///
/// Every key of `base` appears in the result with `base[k] + increments[k]`
/// (missing increments count as zero).
pub fn merge(base: &Ledger, increments: &Ledger) -> Result<Ledger, LedgerError> {
    if let Some(address) = increments.keys().find(|k| !base.contains_key(*k)) {
        return Err(LedgerError::KeyMismatch { address: *address });
    }

    base.iter()
        .map(|(address, balance)| {
            let delta = increments.get(address).copied().unwrap_or(0);
            let merged = balance
                .checked_add(delta)
                .ok_or(LedgerError::Overflow { address: *address })?;
            if merged < 0 {
                return Err(LedgerError::Underflow {
                    address: *address,
                    balance: *balance,
                    delta,
                });
            }
            Ok((*address, merged))
        })
        .collect()
}

/// Sum of all amounts, `None` on overflow.
pub fn total(ledger: &Ledger) -> Option<Amount> {
    ledger
        .values()
        .try_fold(0 as Amount, |acc, amount| acc.checked_add(*amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_raw([byte; 20])
    }

    fn ledger(entries: &[(u8, Amount)]) -> Ledger {
        entries.iter().map(|(b, a)| (addr(*b), *a)).collect()
    }

    #[test]
    fn test_merge_adds_per_key() {
        let base = ledger(&[(1, 10), (2, 20), (3, 30)]);
        let increments = ledger(&[(1, -4), (3, 5)]);

        let merged = merge(&base, &increments).unwrap();

        assert_eq!(merged, ledger(&[(1, 6), (2, 20), (3, 35)]));
    }

    #[test]
    fn test_merge_keeps_base_order() {
        let base = ledger(&[(3, 1), (1, 1), (2, 1)]);
        let increments = ledger(&[(2, 1), (3, 1)]);
        let merged = merge(&base, &increments).unwrap();
        let keys: Vec<_> = merged.keys().copied().collect();
        assert_eq!(keys, vec![addr(3), addr(1), addr(2)]);
    }

    #[test]
    fn test_merge_underflow() {
        let base = ledger(&[(1, 10), (2, 20)]);
        let increments = ledger(&[(2, -21)]);

        assert_eq!(
            merge(&base, &increments),
            Err(LedgerError::Underflow {
                address: addr(2),
                balance: 20,
                delta: -21,
            })
        );
    }

    #[test]
    fn test_merge_to_exactly_zero_is_allowed() {
        let base = ledger(&[(1, 10)]);
        let merged = merge(&base, &ledger(&[(1, -10)])).unwrap();
        assert_eq!(merged[&addr(1)], 0);
    }

    #[test]
    fn test_merge_unknown_key() {
        let base = ledger(&[(1, 10)]);
        let increments = ledger(&[(9, 1)]);

        assert_eq!(
            merge(&base, &increments),
            Err(LedgerError::KeyMismatch { address: addr(9) })
        );
    }

    #[test]
    fn test_merge_overflow() {
        let base = ledger(&[(1, Amount::MAX)]);
        assert_eq!(
            merge(&base, &ledger(&[(1, 1)])),
            Err(LedgerError::Overflow { address: addr(1) })
        );
    }

    #[test]
    fn test_flip_is_involution() {
        let samples = [
            ledger(&[]),
            ledger(&[(1, 0)]),
            ledger(&[(1, 5), (2, -7), (3, 1_000_000_000_000)]),
        ];
        for x in samples {
            assert_eq!(flip(&flip(&x).unwrap()).unwrap(), x);
        }
    }

    #[test]
    fn test_flip_at_amount_bounds() {
        let max = ledger(&[(1, Amount::MAX), (2, -Amount::MAX)]);
        assert_eq!(flip(&flip(&max).unwrap()).unwrap(), max);

        assert_eq!(
            flip(&ledger(&[(1, 3), (2, Amount::MIN)])),
            Err(LedgerError::Overflow { address: addr(2) })
        );
    }

    #[test]
    fn test_total_overflow_is_none() {
        assert_eq!(total(&ledger(&[(1, Amount::MAX), (2, 1)])), None);
        assert_eq!(total(&ledger(&[(1, Amount::MAX), (2, -1)])), Some(Amount::MAX - 1));
    }

    #[test]
    fn test_flip_then_merge_restores_base() {
        let base = ledger(&[(1, 10), (2, 20)]);
        let allocation = ledger(&[(1, 3), (2, 4)]);

        let after_install = merge(&base, &flip(&allocation).unwrap()).unwrap();
        let after_uninstall = merge(&after_install, &allocation).unwrap();

        assert_eq!(after_uninstall, base);
        assert_eq!(total(&after_install), Some(23));
    }
}
