//! In-memory channel registry.

use crate::models::StateChannel;
use parking_lot::RwLock;
use statechannel_types::Address;
use std::collections::HashMap;

/// Latest committed state of every channel this party is in.
///
/// Writers are expected to hold the channel's shard lock; the inner lock
/// only keeps individual reads and writes consistent.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<Address, StateChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the channel at `multisig`.
    pub fn get(&self, multisig: &Address) -> Option<StateChannel> {
        self.channels.read().get(multisig).cloned()
    }

    pub fn contains(&self, multisig: &Address) -> bool {
        self.channels.read().contains_key(multisig)
    }

    /// Replace the channel at `channel.multisig`.
    pub fn commit(&self, channel: StateChannel) {
        self.channels.write().insert(channel.multisig, channel);
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }

    /// Multisig addresses of all known channels.
    pub fn multisigs(&self) -> Vec<Address> {
        let mut out: Vec<Address> = self.channels.read().keys().copied().collect();
        out.sort();
        out
    }
}
