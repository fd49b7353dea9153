//! The protocol engine.

use crate::config::EngineConfig;
use crate::handler::{EngineContext, MethodHandler};
use crate::methods::{MethodRequest, MethodResponse};
use crate::models::StateChannel;
use crate::protocol::{plan_for_signer, Protocol, ProtocolHandler, Proposal};
use crate::registry::ChannelRegistry;
use crate::services::{MessagingService, Signer, StoreService};
use crate::EngineError;
use statechannel_lock::LockManager;
use statechannel_types::{Address, ShardKey};
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes protocol methods for one party.
///
/// Each method's `execute` step runs while holding the locks for all of its
/// shard keys, so methods on the same channel are serialized in arrival
/// order and methods on different channels run concurrently.
pub struct ProtocolEngine {
    ctx: EngineContext,
    locks: LockManager,
}

impl ProtocolEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn StoreService>,
        messaging: Arc<dyn MessagingService>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        let locks = LockManager::new(config.lock_config());
        Self {
            ctx: EngineContext {
                config: Arc::new(config),
                channels: Arc::new(ChannelRegistry::new()),
                store,
                messaging,
                signer,
            },
            locks,
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Address this engine signs as.
    pub fn address(&self) -> Address {
        self.ctx.signer.address()
    }

    /// Latest committed state of a channel.
    pub fn channel(&self, multisig: &Address) -> Option<StateChannel> {
        self.ctx.channels.get(multisig)
    }

    /// Sign a protocol step without committing it.
    ///
    /// The returned signature is handed to the counterparties, who pass it to
    /// [`execute`](Self::execute).
    pub async fn propose<P: Protocol>(&self, protocol: &P) -> Result<Proposal, EngineError> {
        let plan = plan_for_signer(protocol, &self.ctx)?;
        let digest = plan.commitment.hash_to_sign();
        let signature = self.ctx.signer.sign_digest(&digest).await?;
        debug!(protocol = P::KIND.as_str(), multisig = %protocol.multisig(), %digest, "Proposed protocol step");
        Ok(Proposal {
            protocol: P::KIND,
            multisig: protocol.multisig(),
            digest,
            signer: self.address(),
            signature,
        })
    }

    /// Dispatch a request to its handler.
    pub async fn execute(&self, request: MethodRequest) -> Result<MethodResponse, EngineError> {
        match request {
            MethodRequest::Setup { params, signatures } => self
                .run(&ProtocolHandler::new(params, signatures))
                .await
                .map(|outcome| MethodResponse::Committed(Box::new(outcome))),
            MethodRequest::Install { params, signatures } => self
                .run(&ProtocolHandler::new(params, signatures))
                .await
                .map(|outcome| MethodResponse::Committed(Box::new(outcome))),
            MethodRequest::UpdateState { params, signatures } => self
                .run(&ProtocolHandler::new(params, signatures))
                .await
                .map(|outcome| MethodResponse::Committed(Box::new(outcome))),
            MethodRequest::Uninstall { params, signatures } => self
                .run(&ProtocolHandler::new(params, signatures))
                .await
                .map(|outcome| MethodResponse::Committed(Box::new(outcome))),
            MethodRequest::ProposeInstall(propose) => {
                self.run(&propose).await.map(MethodResponse::Proposed)
            }
            MethodRequest::RejectInstall(reject) => {
                self.run(&reject).await.map(MethodResponse::Rejected)
            }
            MethodRequest::GetFreeBalance(query) => {
                self.run(&query).await.map(MethodResponse::FreeBalance)
            }
            MethodRequest::GetAppInstances(query) => {
                self.run(&query).await.map(MethodResponse::AppInstances)
            }
            MethodRequest::GetState(query) => self.run(&query).await.map(MethodResponse::AppState),
            MethodRequest::GetProposedInstalls(query) => {
                self.run(&query).await.map(MethodResponse::ProposedInstalls)
            }
        }
    }

    /// Run `handler` through its hooks, holding its shard locks for `execute`.
    pub async fn run<H: MethodHandler>(&self, handler: &H) -> Result<H::Output, EngineError> {
        handler.before_execution(&self.ctx).await?;

        let keys = handler.shard_keys();
        debug!(method = handler.name(), keys = keys.len(), "Executing method");
        let output = if keys.is_empty() {
            handler.execute(&self.ctx).await
        } else {
            let names: Vec<&str> = keys.iter().map(ShardKey::as_str).collect();
            self.locks
                .with_locks(&names, self.ctx.config.lock_timeout(), handler.execute(&self.ctx))
                .await
        };
        let mut output =
            output.inspect_err(|e| warn!(method = handler.name(), error = %e, "Method failed"))?;

        handler.after_execution(&self.ctx, &mut output).await;
        Ok(output)
    }

    /// Load a channel snapshot written by a previous run into the registry.
    ///
    /// Returns `false` if the store has no snapshot for `multisig`.
    pub async fn restore_channel(&self, multisig: Address) -> Result<bool, EngineError> {
        let key = self.ctx.snapshot_key(&multisig);
        let lock = ShardKey::from(multisig);
        self.locks
            .with_lock(lock.as_str(), self.ctx.config.lock_timeout(), async {
                let Some(value) = self.ctx.store.get(&key).await? else {
                    return Ok(false);
                };
                let channel: StateChannel = serde_json::from_value(value)?;
                self.ctx.channels.commit(channel);
                Ok::<_, EngineError>(true)
            })
            .await
    }
}
