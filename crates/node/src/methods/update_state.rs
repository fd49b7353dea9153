//! App state updates.

use crate::handler::EngineContext;
use crate::protocol::{Plan, Protocol};
use crate::services::ProtocolKind;
use crate::EngineError;
use serde::{Deserialize, Serialize};
use statechannel_commitments::SetStateCommitment;
use statechannel_types::{Address, Hash, ShardKey, StateNonce};

/// Sign a newer state for an installed app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStateParams {
    pub multisig: Address,
    pub app_id: Hash,
    pub state_hash: Hash,
    /// Must be greater than the app's latest nonce.
    pub nonce: StateNonce,
    /// Dispute timeout; the app's default when unset.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Protocol for UpdateStateParams {
    const KIND: ProtocolKind = ProtocolKind::UpdateState;

    fn multisig(&self) -> Address {
        self.multisig
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        vec![ShardKey::from(self.multisig), ShardKey::from(self.app_id)]
    }

    fn plan(&self, ctx: &EngineContext) -> Result<Plan, EngineError> {
        let channel = ctx
            .channels
            .get(&self.multisig)
            .ok_or(EngineError::ChannelNotFound(self.multisig))?;
        let app = channel.app(&self.app_id)?;
        if self.nonce <= app.nonce {
            return Err(EngineError::StaleNonce {
                app_id: self.app_id,
                latest: app.nonce,
                proposed: self.nonce,
            });
        }

        let timeout = self.timeout.unwrap_or(app.identity.default_timeout);
        let commitment = SetStateCommitment::new(
            ctx.config.network.clone(),
            app.identity.clone(),
            self.state_hash,
            self.nonce.0,
            timeout,
        );
        let signers = app.identity.signing_keys.clone();
        let next = channel.with_app(app.with_state(self.state_hash, self.nonce, timeout));

        Ok(Plan {
            channel: next,
            commitment: Box::new(commitment),
            signers,
        })
    }
}
