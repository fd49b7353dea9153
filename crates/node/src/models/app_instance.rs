//! Installed app instances.

use serde::{Deserialize, Serialize};
use statechannel_ledger::Ledger;
use statechannel_types::{AppIdentity, Hash, StateNonce, Terms};

/// An app running inside a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInstance {
    pub identity: AppIdentity,
    pub terms: Terms,
    /// Position in install order; selects the app's uninstall key.
    pub app_seq_no: u64,
    /// What was moved out of the free balance at install.
    pub allocation: Ledger,
    pub state_hash: Hash,
    pub nonce: StateNonce,
    pub timeout: u64,
}

impl AppInstance {
    /// Identity hash, used as the app's id.
    pub fn id(&self) -> Hash {
        self.identity.hash()
    }

    /// Copy with a newer state.
    pub fn with_state(&self, state_hash: Hash, nonce: StateNonce, timeout: u64) -> Self {
        Self {
            state_hash,
            nonce,
            timeout,
            ..self.clone()
        }
    }
}
