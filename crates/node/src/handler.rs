//! Method handler trait and the context handlers run against.

use crate::config::EngineConfig;
use crate::models::StateChannel;
use crate::registry::ChannelRegistry;
use crate::services::{MessagingService, Signer, StoreService};
use crate::EngineError;
use async_trait::async_trait;
use statechannel_types::{Address, ShardKey};
use std::sync::Arc;

/// Shared state and collaborators available to every handler.
#[derive(Clone)]
pub struct EngineContext {
    pub config: Arc<EngineConfig>,
    pub channels: Arc<ChannelRegistry>,
    pub store: Arc<dyn StoreService>,
    pub messaging: Arc<dyn MessagingService>,
    pub signer: Arc<dyn Signer>,
}

impl EngineContext {
    /// Store key of the snapshot for the channel at `multisig`.
    pub fn snapshot_key(&self, multisig: &Address) -> String {
        format!("{}/{}", self.config.store_prefix, multisig)
    }

    /// Persist `channel`, then make it the registry's latest state.
    ///
    /// The caller must hold the channel's shard lock. If the write fails the
    /// registry is left untouched.
    pub async fn commit_channel(&self, channel: StateChannel) -> Result<(), EngineError> {
        let value = serde_json::to_value(&channel)?;
        self.store
            .set(vec![(self.snapshot_key(&channel.multisig), value)], false)
            .await?;
        self.channels.commit(channel);
        Ok(())
    }
}

/// One protocol method.
///
/// The engine calls the hooks in order: `before_execution`, then `execute`
/// while holding every shard lock named by `shard_keys`, then
/// `after_execution`. Only `execute` is mutually exclusive with other
/// methods sharing a key; the hooks must tolerate running concurrently.
///
/// `execute` runs exactly once per call to the engine and is the only step
/// that may change channel state. A failure before or inside it is returned
/// as is. `after_execution` cannot fail the call: once `execute` succeeded
/// the change is durable, so follow-up problems are recorded in the output.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Result of a successful call.
    type Output: Send + Sync;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Resources `execute` needs exclusive access to. Empty means none.
    fn shard_keys(&self) -> Vec<ShardKey>;

    async fn before_execution(&self, _ctx: &EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    async fn execute(&self, ctx: &EngineContext) -> Result<Self::Output, EngineError>;

    async fn after_execution(&self, _ctx: &EngineContext, _output: &mut Self::Output) {}
}
