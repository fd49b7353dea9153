//! The lock table.

use crate::{LockConfig, LockError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

/// Proof of holding a lock. Hand it back to [`LockManager::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTicket {
    name: String,
    key: u64,
}

impl LockTicket {
    /// Name of the held lock.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key issued for this acquisition.
    pub fn key(&self) -> u64 {
        self.key
    }
}

#[derive(Debug)]
struct Waiter {
    key: u64,
    notify: oneshot::Sender<()>,
}

#[derive(Debug, Default)]
struct LockState {
    holder: Option<u64>,
    waiters: VecDeque<Waiter>,
}

impl LockState {
    fn is_idle(&self) -> bool {
        self.holder.is_none() && self.waiters.is_empty()
    }
}

/// Named FIFO locks.
///
/// Shared by reference (usually behind an `Arc`); all methods take `&self`.
#[derive(Debug)]
pub struct LockManager {
    config: LockConfig,
    locks: Mutex<HashMap<String, LockState>>,
    next_key: AtomicU64,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

impl LockManager {
    /// Create a new lock manager with the given configuration.
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            locks: Mutex::new(HashMap::new()),
            next_key: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Acquire `name`, waiting at most `timeout` for earlier holders.
    ///
    /// Dropping the returned future before it completes withdraws the
    /// request; if the lock had already been handed to it, it is passed on.
    pub async fn acquire(&self, name: &str, timeout: Duration) -> Result<LockTicket, LockError> {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        let ticket = LockTicket {
            name: name.to_string(),
            key,
        };

        let rx = {
            let mut locks = self.locks.lock();
            let state = locks.entry(name.to_string()).or_default();
            if state.holder.is_none() && state.waiters.is_empty() {
                state.holder = Some(key);
                trace!(name, key, "Lock acquired");
                return Ok(ticket);
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(Waiter { key, notify: tx });
            debug!(name, key, queued = state.waiters.len(), "Waiting for lock");
            rx
        };

        let mut pending = PendingAcquire {
            manager: self,
            name,
            key,
            armed: true,
        };

        if let Ok(Ok(())) = tokio::time::timeout(timeout, rx).await {
            pending.armed = false;
            trace!(name, key, "Lock handed over");
            return Ok(ticket);
        }

        // The handoff can race the deadline; whoever holds the table lock decides.
        pending.armed = false;
        if self.withdraw(name, key) {
            return Ok(ticket);
        }
        warn!(name, key, ?timeout, "Lock acquisition timed out");
        Err(LockError::Timeout {
            name: name.to_string(),
            timeout,
        })
    }

    /// Release a held lock, handing it to the next live waiter.
    pub fn release(&self, ticket: LockTicket) -> Result<(), LockError> {
        self.release_key(&ticket.name, ticket.key)
    }

    /// Acquire `name` and return a guard that releases on drop.
    pub async fn lock(&self, name: &str, timeout: Duration) -> Result<LockGuard<'_>, LockError> {
        let ticket = self.acquire(name, timeout).await?;
        Ok(LockGuard {
            manager: self,
            ticket: Some(ticket),
        })
    }

    /// Run `body` while holding `name`.
    ///
    /// The lock is released however `body` ends: success, error, panic, or
    /// the returned future being dropped.
    pub async fn with_lock<T, E, F>(&self, name: &str, timeout: Duration, body: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let _guard = self.lock(name, timeout).await?;
        body.await
    }

    /// Run `body` while holding every lock in `names`.
    ///
    /// Names are de-duplicated and taken in sorted order, so two callers with
    /// overlapping sets cannot deadlock. `timeout` bounds the whole
    /// acquisition, not each lock.
    pub async fn with_locks<T, E, F, S>(&self, names: &[S], timeout: Duration, body: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<LockError>,
        S: AsRef<str>,
    {
        let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let deadline = Instant::now() + timeout;
        let mut guards = Vec::with_capacity(sorted.len());
        for name in sorted {
            let remaining = deadline.saturating_duration_since(Instant::now());
            guards.push(self.lock(name, remaining).await?);
        }

        let result = body.await;
        // Release in reverse acquisition order.
        while let Some(guard) = guards.pop() {
            drop(guard);
        }
        result
    }

    /// [`with_lock`](Self::with_lock) with the callback-first argument order.
    pub async fn acquire_lock<T, E, F>(&self, name: &str, body: F, timeout: Duration) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        self.with_lock(name, timeout, body).await
    }

    /// Whether `name` currently has a holder.
    pub fn is_locked(&self, name: &str) -> bool {
        self.locks
            .lock()
            .get(name)
            .is_some_and(|state| state.holder.is_some())
    }

    /// Number of requests waiting for `name`.
    pub fn queue_len(&self, name: &str) -> usize {
        self.locks
            .lock()
            .get(name)
            .map_or(0, |state| state.waiters.len())
    }

    /// Number of lock entries in the table.
    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }

    fn release_key(&self, name: &str, key: u64) -> Result<(), LockError> {
        let mut locks = self.locks.lock();
        let state = match locks.get_mut(name) {
            Some(state) if state.holder == Some(key) => state,
            _ => {
                error!(name, key, "Release with a ticket that does not hold the lock");
                return Err(LockError::KeyMismatch {
                    name: name.to_string(),
                    key,
                });
            }
        };

        state.holder = None;
        while let Some(waiter) = state.waiters.pop_front() {
            state.holder = Some(waiter.key);
            if waiter.notify.send(()).is_ok() {
                trace!(name, from = key, to = waiter.key, "Lock passed to next waiter");
                return Ok(());
            }
            // Waiter went away without withdrawing.
            state.holder = None;
        }

        trace!(name, key, "Lock released");
        if self.config.evict_idle && state.is_idle() {
            locks.remove(name);
        }
        Ok(())
    }

    /// Take a pending request out of the queue.
    ///
    /// Returns `true` if the lock had already been handed to it.
    fn withdraw(&self, name: &str, key: u64) -> bool {
        let mut locks = self.locks.lock();
        let Some(state) = locks.get_mut(name) else {
            return false;
        };
        if state.holder == Some(key) {
            return true;
        }
        state.waiters.retain(|w| w.key != key);
        if self.config.evict_idle && state.is_idle() {
            locks.remove(name);
        }
        false
    }
}

/// Cleans up after an acquisition whose future was dropped mid-wait.
struct PendingAcquire<'a> {
    manager: &'a LockManager,
    name: &'a str,
    key: u64,
    armed: bool,
}

impl Drop for PendingAcquire<'_> {
    fn drop(&mut self) {
        if self.armed && self.manager.withdraw(self.name, self.key) {
            // Granted after the caller stopped listening.
            let _ = self.manager.release_key(self.name, self.key);
        }
    }
}

/// Holds a lock until dropped.
#[derive(Debug)]
pub struct LockGuard<'a> {
    manager: &'a LockManager,
    ticket: Option<LockTicket>,
}

impl LockGuard<'_> {
    pub fn ticket(&self) -> Option<&LockTicket> {
        self.ticket.as_ref()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            if let Err(e) = self.manager.release(ticket) {
                error!(error = %e, "Failed to release lock guard");
            }
        }
    }
}
