//! Read-only queries.
//!
//! Queries read a registry snapshot and take no shard locks.

use crate::handler::{EngineContext, MethodHandler};
use crate::models::{AppInstance, InstallProposal};
use crate::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statechannel_ledger::FreeBalanceState;
use statechannel_types::{Address, Hash, ShardKey, StateNonce};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFreeBalance {
    pub multisig: Address,
}

#[async_trait]
impl MethodHandler for GetFreeBalance {
    type Output = FreeBalanceState;

    fn name(&self) -> &'static str {
        "get_free_balance"
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        Vec::new()
    }

    async fn execute(&self, ctx: &EngineContext) -> Result<FreeBalanceState, EngineError> {
        ctx.channels
            .get(&self.multisig)
            .map(|channel| channel.free_balance)
            .ok_or(EngineError::ChannelNotFound(self.multisig))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAppInstances {
    pub multisig: Address,
}

#[async_trait]
impl MethodHandler for GetAppInstances {
    type Output = Vec<AppInstance>;

    fn name(&self) -> &'static str {
        "get_app_instances"
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        Vec::new()
    }

    /// Installed apps in install order.
    async fn execute(&self, ctx: &EngineContext) -> Result<Vec<AppInstance>, EngineError> {
        let channel = ctx
            .channels
            .get(&self.multisig)
            .ok_or(EngineError::ChannelNotFound(self.multisig))?;
        Ok(channel.app_instances.into_values().collect())
    }
}

/// Latest agreed state of one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub app_id: Hash,
    pub state_hash: Hash,
    pub nonce: StateNonce,
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetState {
    pub multisig: Address,
    pub app_id: Hash,
}

#[async_trait]
impl MethodHandler for GetState {
    type Output = AppState;

    fn name(&self) -> &'static str {
        "get_state"
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        Vec::new()
    }

    async fn execute(&self, ctx: &EngineContext) -> Result<AppState, EngineError> {
        let channel = ctx
            .channels
            .get(&self.multisig)
            .ok_or(EngineError::ChannelNotFound(self.multisig))?;
        let app = channel.app(&self.app_id)?;
        Ok(AppState {
            app_id: self.app_id,
            state_hash: app.state_hash,
            nonce: app.nonce,
            timeout: app.timeout,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetProposedInstalls {
    pub multisig: Address,
}

#[async_trait]
impl MethodHandler for GetProposedInstalls {
    type Output = Vec<InstallProposal>;

    fn name(&self) -> &'static str {
        "get_proposed_installs"
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        Vec::new()
    }

    /// Pending proposals in the order they were made.
    async fn execute(&self, ctx: &EngineContext) -> Result<Vec<InstallProposal>, EngineError> {
        let channel = ctx
            .channels
            .get(&self.multisig)
            .ok_or(EngineError::ChannelNotFound(self.multisig))?;
        Ok(channel.proposed_installs.into_values().collect())
    }
}
