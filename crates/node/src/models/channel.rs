//! State channel model.

use crate::models::{AppInstance, InstallProposal};
use crate::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use statechannel_commitments::{FreeBalanceUpdate, NetworkContext};
use statechannel_ledger::FreeBalanceState;
use statechannel_types::{Address, AppIdentity, Hash};

/// Everything a party knows about one channel.
///
/// Values are replaced wholesale on every committed step; a protocol method
/// builds the next `StateChannel` and the engine swaps it in under the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChannel {
    pub multisig: Address,
    /// Owners in ascending address order.
    pub owners: Vec<Address>,
    pub free_balance: FreeBalanceState,
    pub free_balance_nonce: u64,
    pub app_instances: IndexMap<Hash, AppInstance>,
    /// Sequence number the next installed app receives. The free balance is 0.
    pub next_app_seq_no: u64,
    /// Installs proposed in this channel, keyed by the app id they would get.
    #[serde(default)]
    pub proposed_installs: IndexMap<Hash, InstallProposal>,
}

impl StateChannel {
    /// A freshly set-up channel.
    pub fn new(multisig: Address, mut owners: Vec<Address>, free_balance: FreeBalanceState) -> Self {
        owners.sort();
        owners.dedup();
        Self {
            multisig,
            owners,
            free_balance,
            free_balance_nonce: 0,
            app_instances: IndexMap::new(),
            next_app_seq_no: 1,
            proposed_installs: IndexMap::new(),
        }
    }

    pub fn free_balance_identity(&self, ctx: &NetworkContext) -> AppIdentity {
        ctx.free_balance_identity(self.multisig, &self.owners)
    }

    /// Free-balance write for the state `free_balance` at the next nonce.
    pub fn free_balance_update(
        &self,
        ctx: &NetworkContext,
        free_balance: FreeBalanceState,
        timeout: u64,
    ) -> FreeBalanceUpdate {
        FreeBalanceUpdate {
            identity: self.free_balance_identity(ctx),
            state: free_balance,
            nonce: self.free_balance_nonce + 1,
            timeout,
        }
    }

    pub fn app(&self, app_id: &Hash) -> Result<&AppInstance, EngineError> {
        self.app_instances
            .get(app_id)
            .ok_or(EngineError::AppNotFound {
                multisig: self.multisig,
                app_id: *app_id,
            })
    }

    /// Next channel after installing `app` with the given free balance.
    ///
    /// A matching proposal, if any, is consumed.
    pub fn with_installed(&self, app: AppInstance, free_balance: FreeBalanceState) -> Self {
        let mut next = self.clone();
        next.free_balance = free_balance;
        next.free_balance_nonce += 1;
        next.next_app_seq_no = app.app_seq_no + 1;
        next.proposed_installs.shift_remove(&app.id());
        next.app_instances.insert(app.id(), app);
        next
    }

    pub fn with_proposal(&self, proposal: InstallProposal) -> Self {
        let mut next = self.clone();
        next.proposed_installs.insert(proposal.app_id(), proposal);
        next
    }

    pub fn without_proposal(&self, app_id: &Hash) -> Self {
        let mut next = self.clone();
        next.proposed_installs.shift_remove(app_id);
        next
    }

    /// Next channel after uninstalling `app_id` with the given free balance.
    pub fn with_uninstalled(&self, app_id: &Hash, free_balance: FreeBalanceState) -> Self {
        let mut next = self.clone();
        next.free_balance = free_balance;
        next.free_balance_nonce += 1;
        next.app_instances.shift_remove(app_id);
        next
    }

    /// Next channel with `app` replacing the instance of the same id.
    pub fn with_app(&self, app: AppInstance) -> Self {
        let mut next = self.clone();
        next.app_instances.insert(app.id(), app);
        next
    }
}
