//! Counterparty messaging.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use statechannel_types::{Address, Hash, Signature};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Protocol step a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolKind {
    Setup,
    Install,
    UpdateState,
    Uninstall,
}

impl ProtocolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::Setup => "setup",
            ProtocolKind::Install => "install",
            ProtocolKind::UpdateState => "update_state",
            ProtocolKind::Uninstall => "uninstall",
        }
    }
}

/// Notice that a protocol step was committed, carrying the sender's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub from: Address,
    pub to: Address,
    pub protocol: ProtocolKind,
    pub multisig: Address,
    pub digest: Hash,
    pub signature: Signature,
}

/// Errors from a messaging backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessagingError {
    /// The transport refused or lost the message.
    #[error("Failed to deliver message to {to}: {reason}")]
    Delivery {
        /// Recipient.
        to: Address,
        /// Backend description.
        reason: String,
    },
}

/// Callback invoked for each message delivered to an address.
pub type MessageCallback = Arc<dyn Fn(ProtocolMessage) + Send + Sync>;

/// Delivery of protocol messages between parties.
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Send `message` to `to`.
    async fn send(&self, to: Address, message: ProtocolMessage) -> Result<(), MessagingError>;

    /// Register a callback for messages addressed to `address`.
    fn on_receive(&self, address: Address, callback: MessageCallback);
}

#[derive(Default)]
struct Mailboxes {
    listeners: HashMap<Address, Vec<MessageCallback>>,
    undelivered: HashMap<Address, Vec<ProtocolMessage>>,
}

/// In-process messaging.
///
/// Messages for an address with no listener are held and delivered, in
/// order, when the first listener registers.
#[derive(Clone, Default)]
pub struct MemoryMessagingService {
    inner: Arc<Mutex<Mailboxes>>,
}

impl MemoryMessagingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting for a listener at `address`.
    pub fn pending(&self, address: &Address) -> Vec<ProtocolMessage> {
        self.inner
            .lock()
            .undelivered
            .get(address)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessagingService for MemoryMessagingService {
    async fn send(&self, to: Address, message: ProtocolMessage) -> Result<(), MessagingError> {
        let listeners = {
            let mut inner = self.inner.lock();
            match inner.listeners.get(&to) {
                Some(listeners) if !listeners.is_empty() => listeners.clone(),
                _ => {
                    debug!(%to, protocol = ?message.protocol, "Holding message until a listener registers");
                    inner.undelivered.entry(to).or_default().push(message);
                    return Ok(());
                }
            }
        };
        // Run callbacks without the mailbox lock so they may send in turn.
        for listener in listeners {
            listener(message.clone());
        }
        Ok(())
    }

    fn on_receive(&self, address: Address, callback: MessageCallback) {
        let backlog = {
            let mut inner = self.inner.lock();
            inner
                .listeners
                .entry(address)
                .or_default()
                .push(callback.clone());
            inner.undelivered.remove(&address).unwrap_or_default()
        };
        for message in backlog {
            callback(message);
        }
    }
}
