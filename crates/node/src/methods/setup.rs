//! Channel setup.

use crate::handler::EngineContext;
use crate::models::StateChannel;
use crate::protocol::{Plan, Protocol};
use crate::services::ProtocolKind;
use crate::EngineError;
use serde::{Deserialize, Serialize};
use statechannel_commitments::SetupCommitment;
use statechannel_ledger::{FreeBalanceState, Ledger, LedgerError};
use statechannel_types::Address;

/// Open a channel on a deployed multisig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupParams {
    pub multisig: Address,
    pub owners: Vec<Address>,
    /// Opening free balance per owner. Owners not listed start at zero.
    #[serde(default)]
    pub deposits: Ledger,
}

impl SetupParams {
    fn free_balance(&self, owners: &[Address]) -> Result<FreeBalanceState, EngineError> {
        if let Some(address) = self.deposits.keys().find(|a| !owners.contains(a)) {
            return Err(LedgerError::KeyMismatch { address: *address }.into());
        }
        let balances = owners
            .iter()
            .map(|owner| (*owner, self.deposits.get(owner).copied().unwrap_or(0)));
        Ok(FreeBalanceState::new(balances)?)
    }
}

impl Protocol for SetupParams {
    const KIND: ProtocolKind = ProtocolKind::Setup;

    fn multisig(&self) -> Address {
        self.multisig
    }

    fn plan(&self, ctx: &EngineContext) -> Result<Plan, EngineError> {
        if ctx.channels.contains(&self.multisig) {
            return Err(EngineError::ChannelExists(self.multisig));
        }

        let mut owners = self.owners.clone();
        owners.sort();
        owners.dedup();
        let free_balance = self.free_balance(&owners)?;
        let channel = StateChannel::new(self.multisig, owners, free_balance);
        let commitment = SetupCommitment::new(
            ctx.config.network.clone(),
            self.multisig,
            channel.owners.clone(),
        )?;

        Ok(Plan {
            signers: channel.owners.clone(),
            channel,
            commitment: Box::new(commitment),
        })
    }
}
