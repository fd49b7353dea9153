//! Configuration for the lock manager.

/// Configuration for [`LockManager`](crate::LockManager).
///
/// Acquisition deadlines are given per call, so the only setting is how
/// long idle entries live.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Drop a lock's entry as soon as it has no holder and no waiters.
    ///
    /// When disabled, every name ever locked stays in the table.
    pub evict_idle: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { evict_idle: true }
    }
}

impl LockConfig {
    /// Keep idle lock entries around.
    pub fn without_eviction(mut self) -> Self {
        self.evict_idle = false;
        self
    }
}
