//! Deployed contract addresses.

use serde::{Deserialize, Serialize};
use statechannel_types::{Address, AppIdentity, Terms};

/// Default dispute timeout of the free-balance app, in blocks.
pub const FREE_BALANCE_DEFAULT_TIMEOUT: u64 = 172_800;

/// Limit written into the free-balance terms (0.001 ETH, in wei).
pub const FREE_BALANCE_TERMS_LIMIT: u128 = 1_000_000_000_000_000;

/// Addresses of the contracts every channel on a network interacts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkContext {
    /// Stores signed app states and resolves disputes.
    pub app_registry: Address,
    /// Stores dependency nonces keyed by uninstall key.
    pub nonce_registry: Address,
    /// Batches sub-calls into one multisig transaction.
    pub multi_send: Address,
    /// Executes a conditional transfer once its dependency nonce allows it.
    pub state_channel_transaction: Address,
    /// App definition of the free-balance app.
    pub free_balance_app: Address,
}

impl NetworkContext {
    /// Terms of every channel's free-balance app.
    pub fn free_balance_terms(&self) -> Terms {
        Terms::eth(FREE_BALANCE_TERMS_LIMIT)
    }

    /// Identity of the free-balance app of the channel at `multisig`.
    pub fn free_balance_identity(&self, multisig: Address, owners: &[Address]) -> AppIdentity {
        AppIdentity {
            owner: multisig,
            signing_keys: owners.to_vec(),
            app_definition: self.free_balance_app,
            terms_hash: self.free_balance_terms().hash(),
            default_timeout: FREE_BALANCE_DEFAULT_TIMEOUT,
        }
    }

    /// Context with fixed, distinct placeholder addresses.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_testing() -> Self {
        Self {
            app_registry: Address::from_raw([0xa1; 20]),
            nonce_registry: Address::from_raw([0xa2; 20]),
            multi_send: Address::from_raw([0xa3; 20]),
            state_channel_transaction: Address::from_raw([0xa4; 20]),
            free_balance_app: Address::from_raw([0xa5; 20]),
        }
    }
}
