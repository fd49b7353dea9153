//! App installation.

use crate::handler::EngineContext;
use crate::models::{AppInstance, StateChannel};
use crate::protocol::{Plan, Protocol};
use crate::services::ProtocolKind;
use crate::EngineError;
use serde::{Deserialize, Serialize};
use statechannel_commitments::InstallCommitment;
use statechannel_ledger::{flip, from_state, merge, total, FreeBalanceState, Ledger, LedgerError};
use statechannel_types::{Address, AppIdentity, Hash, StateNonce, Terms};

/// Install an app, funding it from the free balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallParams {
    pub multisig: Address,
    pub app_definition: Address,
    pub terms: Terms,
    /// Amount each owner moves into the app.
    pub allocation: Ledger,
    pub initial_state_hash: Hash,
    pub default_timeout: u64,
}

impl InstallParams {
    fn check_allocation(&self) -> Result<(), EngineError> {
        if let Some((address, amount)) = self.allocation.iter().find(|(_, a)| **a < 0) {
            return Err(EngineError::InvalidAllocation {
                address: *address,
                amount: *amount,
            });
        }
        let requested = total(&self.allocation).ok_or(LedgerError::Overflow {
            address: self.multisig,
        })?;
        if requested as u128 > self.terms.limit {
            return Err(EngineError::TermsExceeded {
                limit: self.terms.limit,
                requested,
            });
        }
        Ok(())
    }

    /// Identity of the app this install creates in `channel`.
    fn identity(&self, channel: &StateChannel) -> AppIdentity {
        AppIdentity {
            owner: self.multisig,
            signing_keys: channel.owners.clone(),
            app_definition: self.app_definition,
            terms_hash: self.terms.hash(),
            default_timeout: self.default_timeout,
        }
    }

    /// Check the install against `channel` and compute the free balance
    /// left once the allocation is moved out.
    pub(crate) fn prepare(
        &self,
        channel: &StateChannel,
    ) -> Result<(AppIdentity, FreeBalanceState), EngineError> {
        self.check_allocation()?;

        let identity = self.identity(channel);
        let app_id = identity.hash();
        if channel.app_instances.contains_key(&app_id) {
            return Err(EngineError::AppExists(app_id));
        }

        let remaining = merge(&from_state(&channel.free_balance), &flip(&self.allocation)?)?;
        let free_balance = channel.free_balance.apply(&remaining)?;
        Ok((identity, free_balance))
    }
}

impl Protocol for InstallParams {
    const KIND: ProtocolKind = ProtocolKind::Install;

    fn multisig(&self) -> Address {
        self.multisig
    }

    fn plan(&self, ctx: &EngineContext) -> Result<Plan, EngineError> {
        let channel = ctx
            .channels
            .get(&self.multisig)
            .ok_or(EngineError::ChannelNotFound(self.multisig))?;
        let (identity, free_balance) = self.prepare(&channel)?;
        let app_id = identity.hash();

        let app = AppInstance {
            identity,
            terms: self.terms,
            app_seq_no: channel.next_app_seq_no,
            allocation: self.allocation.clone(),
            state_hash: self.initial_state_hash,
            nonce: StateNonce::INITIAL,
            timeout: self.default_timeout,
        };
        let network = ctx.config.network.clone();
        let update = channel.free_balance_update(
            &network,
            free_balance.clone(),
            ctx.config.free_balance_timeout,
        );
        let commitment = InstallCommitment::new(
            network,
            self.multisig,
            channel.owners.clone(),
            update,
            app_id,
            self.terms,
            app.app_seq_no,
        )?;

        Ok(Plan {
            signers: channel.owners.clone(),
            channel: channel.with_installed(app, free_balance),
            commitment: Box::new(commitment),
        })
    }
}
