//! Two-phase signing shared by the channel protocols.
//!
//! Every owner first *proposes*: it derives the next channel state and its
//! commitment from the same inputs and signs the commitment digest. The
//! signatures are exchanged out of band, then every owner *executes*: the
//! engine re-derives the commitment under the channel's shard lock, checks
//! each counterparty signature against it, adds its own and commits.
//!
//! Because the commitment is re-derived under the lock, a signature made
//! over a state that has since moved on fails validation instead of
//! committing a stale step.

use crate::handler::{EngineContext, MethodHandler};
use crate::models::StateChannel;
use crate::services::{ProtocolKind, ProtocolMessage};
use crate::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statechannel_commitments::{validate_signature, Commitment};
use statechannel_types::{Address, Hash, ShardKey, Signature, Transaction};
use tracing::{debug, info, warn};

/// Outcome of planning a protocol step against the current channel state.
pub struct Plan {
    /// Channel state once the step commits.
    pub channel: StateChannel,
    pub commitment: Box<dyn Commitment + Send + Sync>,
    /// Addresses whose signatures the commitment needs, ascending.
    pub signers: Vec<Address>,
}

/// A state-changing channel protocol.
pub trait Protocol: Send + Sync {
    const KIND: ProtocolKind;

    /// Channel the step applies to.
    fn multisig(&self) -> Address;

    fn shard_keys(&self) -> Vec<ShardKey> {
        vec![ShardKey::from(self.multisig())]
    }

    /// Derive the next channel state and its commitment.
    ///
    /// Must be a pure function of the inputs and the registry contents.
    fn plan(&self, ctx: &EngineContext) -> Result<Plan, EngineError>;
}

/// Plan `protocol` and check the local signer takes part.
pub(crate) fn plan_for_signer<P: Protocol>(
    protocol: &P,
    ctx: &EngineContext,
) -> Result<Plan, EngineError> {
    let plan = protocol.plan(ctx)?;
    let me = ctx.signer.address();
    if !plan.signers.contains(&me) {
        return Err(EngineError::NotAnOwner(me));
    }
    Ok(plan)
}

/// The local party's signature over a planned step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub protocol: ProtocolKind,
    pub multisig: Address,
    pub digest: Hash,
    pub signer: Address,
    pub signature: Signature,
}

/// A committed protocol step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolOutcome {
    pub protocol: ProtocolKind,
    pub multisig: Address,
    pub digest: Hash,
    /// Local signature included in `transaction`.
    pub signature: Signature,
    /// Transaction enforcing the step on-chain.
    pub transaction: Transaction,
    /// Channel state after the step.
    pub channel: StateChannel,
    /// Counterparties the commit notice could not be delivered to. The step
    /// is committed and persisted regardless.
    pub undelivered: Vec<Address>,
}

/// Runs a [`Protocol`] step given the counterparties' signatures.
pub struct ProtocolHandler<P> {
    protocol: P,
    /// One signature per counterparty, in ascending signer order.
    counterparty_signatures: Vec<Signature>,
}

impl<P: Protocol> ProtocolHandler<P> {
    pub fn new(protocol: P, counterparty_signatures: Vec<Signature>) -> Self {
        Self {
            protocol,
            counterparty_signatures,
        }
    }
}

#[async_trait]
impl<P: Protocol> MethodHandler for ProtocolHandler<P> {
    type Output = ProtocolOutcome;

    fn name(&self) -> &'static str {
        P::KIND.as_str()
    }

    fn shard_keys(&self) -> Vec<ShardKey> {
        self.protocol.shard_keys()
    }

    async fn execute(&self, ctx: &EngineContext) -> Result<ProtocolOutcome, EngineError> {
        let plan = plan_for_signer(&self.protocol, ctx)?;
        let me = ctx.signer.address();
        let commitment = plan.commitment.as_ref();
        let digest = commitment.hash_to_sign();

        let mut signatures = Vec::with_capacity(plan.signers.len());
        let counterparties = plan.signers.iter().filter(|signer| **signer != me);
        for (i, counterparty) in counterparties.enumerate() {
            let signature = self.counterparty_signatures.get(i);
            validate_signature(*counterparty, Some(commitment as &dyn Commitment), signature)?;
            signatures.extend(signature.cloned());
        }

        let signature = ctx.signer.sign_digest(&digest).await?;
        signatures.push(signature);
        let transaction = commitment.to_transaction(&signatures)?;

        ctx.commit_channel(plan.channel.clone()).await?;
        info!(
            protocol = P::KIND.as_str(),
            multisig = %self.protocol.multisig(),
            %digest,
            "Committed protocol step"
        );

        Ok(ProtocolOutcome {
            protocol: P::KIND,
            multisig: self.protocol.multisig(),
            digest,
            signature,
            transaction,
            channel: plan.channel,
            undelivered: Vec::new(),
        })
    }

    async fn after_execution(&self, ctx: &EngineContext, output: &mut ProtocolOutcome) {
        let me = ctx.signer.address();
        let counterparties: Vec<Address> = output
            .channel
            .owners
            .iter()
            .copied()
            .filter(|owner| *owner != me)
            .collect();

        for to in counterparties {
            debug!(%to, protocol = output.protocol.as_str(), "Notifying counterparty");
            let message = ProtocolMessage {
                from: me,
                to,
                protocol: output.protocol,
                multisig: output.multisig,
                digest: output.digest,
                signature: output.signature,
            };
            if let Err(e) = ctx.messaging.send(to, message).await {
                warn!(%to, protocol = output.protocol.as_str(), error = %e, "Counterparty not notified");
                output.undelivered.push(to);
            }
        }
    }
}
