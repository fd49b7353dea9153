//! Engine configuration.

use serde::{Deserialize, Serialize};
use statechannel_commitments::NetworkContext;
use statechannel_lock::LockConfig;
use std::time::Duration;

/// Errors loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("Invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("Invalid engine config: {0}")]
    Invalid(&'static str),
}

/// Configuration for a [`ProtocolEngine`](crate::ProtocolEngine).
///
/// ```toml
/// lock_timeout_ms = 5000
///
/// [network]
/// app_registry = "0x..."
/// nonce_registry = "0x..."
/// multi_send = "0x..."
/// state_channel_transaction = "0x..."
/// free_balance_app = "0x..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deployed contract addresses.
    pub network: NetworkContext,

    /// How long a request waits for its shard locks.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Drop lock entries once idle.
    #[serde(default = "default_evict_idle_locks")]
    pub evict_idle_locks: bool,

    /// Dispute timeout written into free-balance updates.
    #[serde(default)]
    pub free_balance_timeout: u64,

    /// Store prefix for channel snapshots.
    #[serde(default = "default_store_prefix")]
    pub store_prefix: String,
}

fn default_lock_timeout_ms() -> u64 {
    30_000
}

fn default_evict_idle_locks() -> bool {
    true
}

fn default_store_prefix() -> String {
    "/channels".to_string()
}

impl EngineConfig {
    /// Create a config for `network` with default settings.
    pub fn new(network: NetworkContext) -> Self {
        Self {
            network,
            lock_timeout_ms: default_lock_timeout_ms(),
            evict_idle_locks: default_evict_idle_locks(),
            free_balance_timeout: 0,
            store_prefix: default_store_prefix(),
        }
    }

    /// Parse a config from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        if config.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid("lock_timeout_ms must be positive"));
        }
        Ok(config)
    }

    /// Set the lock timeout.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Keep idle lock entries.
    pub fn without_lock_eviction(mut self) -> Self {
        self.evict_idle_locks = false;
        self
    }

    /// Set the free-balance dispute timeout.
    pub fn with_free_balance_timeout(mut self, timeout: u64) -> Self {
        self.free_balance_timeout = timeout;
        self
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Lock manager settings derived from this config.
    pub fn lock_config(&self) -> LockConfig {
        LockConfig {
            evict_idle: self.evict_idle_locks,
        }
    }
}
