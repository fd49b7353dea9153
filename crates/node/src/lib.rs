//! Protocol method executor for state channels.
//!
//! A [`ProtocolEngine`] holds one party's view of its channels and runs the
//! channel protocols against it. Every state-changing method goes through
//! two phases:
//!
//! 1. **Propose**: each owner calls [`ProtocolEngine::propose`] with the same
//!    parameters and gets back its signature over the step's commitment.
//! 2. **Execute**: each owner calls [`ProtocolEngine::execute`] with the
//!    other owners' signatures. The engine re-derives the commitment under
//!    the channel's shard lock, validates every counterparty signature,
//!    signs, commits the new channel state and returns the enforcing
//!    transaction.
//!
//! # Methods
//!
//! | Method | Shard keys | Commitment |
//! |--------|------------|------------|
//! | `setup` | multisig | setup (free balance conditional transaction) |
//! | `install` | multisig | install (free balance update + app conditional transaction) |
//! | `update_state` | multisig, app id | set-state |
//! | `uninstall` | multisig | uninstall (free balance update + dependency nonce) |
//! | `propose_install` | multisig | none (local bookkeeping) |
//! | `reject_install` | multisig | none (local bookkeeping) |
//! | `get_free_balance` | none | none |
//! | `get_app_instances` | none | none |
//! | `get_state` | none | none |
//! | `get_proposed_installs` | none | none |
//!
//! # Hooks
//!
//! Each method is a [`MethodHandler`]. `before_execution` and
//! `after_execution` run outside the shard locks; `execute` runs exactly
//! once, inside them. A step commits by writing a JSON snapshot of the
//! channel to the [`StoreService`] and then swapping it into the registry,
//! both under the lock. Counterparties are notified through the
//! [`MessagingService`] afterwards; a failed notice is reported in the
//! outcome and does not undo the step.

mod config;
mod engine;
mod error;
mod handler;
pub mod methods;
pub mod models;
mod protocol;
mod registry;
pub mod services;

pub use config::{ConfigError, EngineConfig};
pub use engine::ProtocolEngine;
pub use error::EngineError;
pub use handler::{EngineContext, MethodHandler};
pub use methods::{MethodRequest, MethodResponse};
pub use protocol::{Plan, Proposal, Protocol, ProtocolHandler, ProtocolOutcome};
pub use registry::ChannelRegistry;
pub use services::{MessagingService, Signer, StoreService};
