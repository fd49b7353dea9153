//! Install proposals.
//!
//! A proposal records an install a party intends to run so that clients can
//! list, accept or reject it before any signature is exchanged. Proposing
//! validates the install against the current channel but moves no funds.

use crate::handler::{EngineContext, MethodHandler};
use crate::methods::InstallParams;
use crate::models::InstallProposal;
use crate::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statechannel_types::{Address, Hash, ShardKey};
use tracing::info;

/// Record a proposed install. Returns the app id it would get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeInstall {
    pub params: InstallParams,
}

#[async_trait]
impl MethodHandler for ProposeInstall {
    type Output = Hash;

    fn name(&self) -> &'static str {
        "propose_install"
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        vec![ShardKey::from(self.params.multisig)]
    }

    async fn execute(&self, ctx: &EngineContext) -> Result<Hash, EngineError> {
        let multisig = self.params.multisig;
        let channel = ctx
            .channels
            .get(&multisig)
            .ok_or(EngineError::ChannelNotFound(multisig))?;
        let me = ctx.signer.address();
        if !channel.owners.contains(&me) {
            return Err(EngineError::NotAnOwner(me));
        }

        let (identity, _) = self.params.prepare(&channel)?;
        let app_id = identity.hash();
        if channel.proposed_installs.contains_key(&app_id) {
            return Err(EngineError::ProposalExists(app_id));
        }

        let proposal = InstallProposal {
            identity,
            terms: self.params.terms,
            allocation: self.params.allocation.clone(),
            initial_state_hash: self.params.initial_state_hash,
            proposed_by: me,
        };
        ctx.commit_channel(channel.with_proposal(proposal)).await?;
        info!(%multisig, %app_id, "Recorded install proposal");
        Ok(app_id)
    }
}

/// Drop a proposed install. Returns the app id that was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectInstall {
    pub multisig: Address,
    pub app_id: Hash,
}

#[async_trait]
impl MethodHandler for RejectInstall {
    type Output = Hash;

    fn name(&self) -> &'static str {
        "reject_install"
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        vec![ShardKey::from(self.multisig)]
    }

    async fn execute(&self, ctx: &EngineContext) -> Result<Hash, EngineError> {
        let channel = ctx
            .channels
            .get(&self.multisig)
            .ok_or(EngineError::ChannelNotFound(self.multisig))?;
        if !channel.proposed_installs.contains_key(&self.app_id) {
            return Err(EngineError::ProposalNotFound {
                multisig: self.multisig,
                app_id: self.app_id,
            });
        }

        ctx.commit_channel(channel.without_proposal(&self.app_id)).await?;
        info!(multisig = %self.multisig, app_id = %self.app_id, "Rejected install proposal");
        Ok(self.app_id)
    }
}
