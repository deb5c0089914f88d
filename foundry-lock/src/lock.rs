//! Lease lock acquire/release and the shared lock capability interface.

use std::sync::Arc;
use std::time::Duration;

use foundry_core::time::Clock;

use crate::backend::{Lease, LeaseBackend, PutOutcome};
use crate::error::LockError;

/// Lock id used when the configuration does not name one.
pub const DEFAULT_LOCK_ID: &str = "foundry-pipeline-lock";
/// Lease TTL written on every successful acquire.
pub const DEFAULT_TTL: Duration = Duration::from_secs(120);
/// How long `acquire` keeps retrying before giving up.
pub const DEFAULT_WAIT_BUDGET: Duration = Duration::from_secs(60);
/// Sleep between contended acquire attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Capability interface
// ---------------------------------------------------------------------------

/// Shared `{acquire, release}` surface of the real lock and the no-op lock.
pub trait PipelineLock {
    /// Try to take the lock, blocking up to `wait_budget` and sleeping
    /// `poll_interval` between contended attempts.
    ///
    /// `Ok(false)` means the budget elapsed while someone else held a valid
    /// lease. Backend faults propagate immediately.
    fn acquire(&self, wait_budget: Duration, poll_interval: Duration) -> Result<bool, LockError>;

    /// Unconditionally delete the lease. Failures are logged, never raised;
    /// calling release twice is safe.
    fn release(&self);
}

/// Scope guard: releases the lock on drop, on every exit path.
pub struct HeldLock<'a> {
    lock: &'a dyn PipelineLock,
}

impl<'a> HeldLock<'a> {
    /// Acquire `lock` and wrap it so release happens at scope exit.
    ///
    /// Returns `Ok(None)` when the wait budget elapses.
    pub fn acquire(
        lock: &'a dyn PipelineLock,
        wait_budget: Duration,
        poll_interval: Duration,
    ) -> Result<Option<Self>, LockError> {
        if lock.acquire(wait_budget, poll_interval)? {
            Ok(Some(Self { lock }))
        } else {
            Ok(None)
        }
    }
}

impl Drop for HeldLock<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

// ---------------------------------------------------------------------------
// Lease lock
// ---------------------------------------------------------------------------

/// TTL-based distributed lock over a [`LeaseBackend`].
pub struct LeaseLock<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    lock_id: String,
    ttl: chrono::Duration,
}

impl<B: LeaseBackend> LeaseLock<B> {
    pub fn new(backend: B, clock: Arc<dyn Clock>, lock_id: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            clock,
            lock_id: lock_id.into(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn lock_id(&self) -> &str {
        &self.lock_id
    }
}

impl<B: LeaseBackend> PipelineLock for LeaseLock<B> {
    fn acquire(&self, wait_budget: Duration, poll_interval: Duration) -> Result<bool, LockError> {
        let budget = chrono::Duration::from_std(wait_budget).unwrap_or(chrono::Duration::MAX);
        let deadline = self.clock.now() + budget;

        loop {
            let now = self.clock.now();
            let lease = Lease {
                lock_id: self.lock_id.clone(),
                expires_at: now + self.ttl,
            };
            match self.backend.put_if_absent_or_expired(&lease, now)? {
                PutOutcome::Acquired => {
                    tracing::info!("lock acquired (lock_id={})", self.lock_id);
                    return Ok(true);
                }
                PutOutcome::Contended => {
                    if self.clock.now() >= deadline {
                        tracing::error!(
                            "failed to acquire lock {} within {}s",
                            self.lock_id,
                            wait_budget.as_secs()
                        );
                        return Ok(false);
                    }
                    tracing::info!(
                        "lock is currently held; retrying in {}s",
                        poll_interval.as_secs()
                    );
                    self.clock.sleep(poll_interval);
                }
            }
        }
    }

    fn release(&self) {
        match self.backend.delete(&self.lock_id) {
            Ok(()) => tracing::info!("lock released (lock_id={})", self.lock_id),
            Err(e) => tracing::error!("failed to release lock {}: {e}", self.lock_id),
        }
    }
}

// ---------------------------------------------------------------------------
// No-op lock
// ---------------------------------------------------------------------------

/// Fallback for environments without a coordination backend.
///
/// Provides no exclusion whatsoever; every acquire succeeds with a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLock;

impl PipelineLock for NoopLock {
    fn acquire(&self, _wait_budget: Duration, _poll_interval: Duration) -> Result<bool, LockError> {
        tracing::warn!("no-op lock in use; no distributed locking in effect");
        Ok(true)
    }

    fn release(&self) {
        tracing::warn!("no-op lock release called; nothing to do");
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Closed set of lock backends, chosen by explicit configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockConfig {
    /// Real lease lock backed by a shared directory.
    File {
        dir: std::path::PathBuf,
        lock_id: String,
        ttl: Duration,
    },
    /// No coordination backend configured: [`NoopLock`].
    Disabled,
}

/// Build the configured lock variant.
pub fn lock_from_config(config: LockConfig, clock: Arc<dyn Clock>) -> Box<dyn PipelineLock> {
    match config {
        LockConfig::File { dir, lock_id, ttl } => Box::new(LeaseLock::new(
            crate::backend::FileLeaseBackend::new(dir),
            clock,
            lock_id,
            ttl,
        )),
        LockConfig::Disabled => {
            tracing::warn!("no lock backend configured; using no-op lock");
            Box::new(NoopLock)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
