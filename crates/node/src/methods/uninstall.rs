//! App uninstallation.

use crate::handler::EngineContext;
use crate::protocol::{Plan, Protocol};
use crate::services::ProtocolKind;
use crate::EngineError;
use serde::{Deserialize, Serialize};
use statechannel_commitments::UninstallCommitment;
use statechannel_ledger::{from_state, merge, total, Ledger, LedgerError};
use statechannel_types::{Address, Hash};

/// Remove an app and credit its payout to the free balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallParams {
    pub multisig: Address,
    pub app_id: Hash,
    /// Final split of the app's funds. Must total what was allocated.
    pub payout: Ledger,
}

impl Protocol for UninstallParams {
    const KIND: ProtocolKind = ProtocolKind::Uninstall;

    fn multisig(&self) -> Address {
        self.multisig
    }

    fn plan(&self, ctx: &EngineContext) -> Result<Plan, EngineError> {
        let channel = ctx
            .channels
            .get(&self.multisig)
            .ok_or(EngineError::ChannelNotFound(self.multisig))?;
        let app = channel.app(&self.app_id)?;

        if let Some((address, amount)) = self.payout.iter().find(|(_, a)| **a < 0) {
            return Err(EngineError::InvalidAllocation {
                address: *address,
                amount: *amount,
            });
        }
        let overflow = LedgerError::Overflow {
            address: self.multisig,
        };
        let expected = total(&app.allocation).ok_or_else(|| overflow.clone())?;
        let actual = total(&self.payout).ok_or(overflow)?;
        if expected != actual {
            return Err(EngineError::PayoutMismatch { expected, actual });
        }

        let credited = merge(&from_state(&channel.free_balance), &self.payout)?;
        let free_balance = channel.free_balance.apply(&credited)?;

        let network = ctx.config.network.clone();
        let update = channel.free_balance_update(
            &network,
            free_balance.clone(),
            ctx.config.free_balance_timeout,
        );
        let commitment = UninstallCommitment::new(
            network,
            self.multisig,
            channel.owners.clone(),
            update,
            app.app_seq_no,
        )?;

        Ok(Plan {
            signers: channel.owners.clone(),
            channel: channel.with_uninstalled(&self.app_id, free_balance),
            commitment: Box::new(commitment),
        })
    }
}
