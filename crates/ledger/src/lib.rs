//! Free-balance bookkeeping for state channels.
//!
//! A channel's free balance is the ordered list of what each participant can
//! claim right now. Protocol steps never rewrite it directly; they compute an
//! increment ledger (positive or negative deltas per holder) and merge it
//! into the current balances:
//!
//! ```text
//! install:    merge(free_balance, flip(app_allocation))
//! uninstall:  merge(free_balance, app_payout)
//! ```
//!
//! Merges are closed-world. They adjust existing holders only, and fail
//! rather than produce a negative balance.

mod balances;
mod free_balance;

pub use balances::{flip, from_state, merge, total, Amount, Ledger, LedgerError};
pub use free_balance::{Balance, FreeBalanceState};
