//! Lock errors.

use std::time::Duration;

/// Errors from acquiring or releasing a lock.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// This request's turn did not come before its deadline.
    ///
    /// Requests queued ahead of it are unaffected; retrying is safe.
    #[error("Timed out after {timeout:?} waiting for lock {name}")]
    Timeout {
        /// Lock name.
        name: String,
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// Release with a ticket that does not hold the lock.
    #[error("Ticket {key} does not hold lock {name}")]
    KeyMismatch {
        /// Lock name.
        name: String,
        /// Key of the rejected ticket.
        key: u64,
    },
}
