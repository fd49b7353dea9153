//! Installs proposed but not yet signed.

use serde::{Deserialize, Serialize};
use statechannel_ledger::Ledger;
use statechannel_types::{Address, AppIdentity, Hash, Terms};

/// An app install a party has proposed and is waiting to run.
///
/// Proposals are local bookkeeping. They reserve nothing in the free
/// balance; the install itself re-checks everything when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallProposal {
    pub identity: AppIdentity,
    pub terms: Terms,
    pub allocation: Ledger,
    pub initial_state_hash: Hash,
    /// Party that recorded the proposal.
    pub proposed_by: Address,
}

impl InstallProposal {
    /// Id the app will have once installed.
    pub fn app_id(&self) -> Hash {
        self.identity.hash()
    }
}
