//! Exclusive execution per named resource.
//!
//! Each name (a channel's multisig address, an app instance id) has at most
//! one holder. Further requests queue in FIFO order and each waits under its
//! own deadline:
//!
//! ```text
//! Idle ──acquire──▶ Held(k1) ──release(k1)──▶ Held(k2) ──release(k2)──▶ Idle
//!                      ▲                          ▲
//!                 waiters: [k2, k3]          waiters: [k3]
//! ```
//!
//! Locks are created on first use and, with [`LockConfig::evict_idle`], dropped
//! again once nobody holds or waits for them.
//!
//! Scope is a single process. Two processes serving the same channel each
//! need their own coordination.

mod config;
mod error;
mod manager;

pub use config::LockConfig;
pub use error::LockError;
pub use manager::{LockGuard, LockManager, LockTicket};
