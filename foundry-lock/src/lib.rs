//! # foundry-lock
//!
//! Lease-based mutual exclusion for pipeline runs.
//!
//! A [`LeaseLock`] serializes concurrent pipeline invocations through a
//! [`LeaseBackend`] offering an atomic "create-if-absent-or-expired" write.
//! Expired leases are stealable by any caller. [`NoopLock`] stands in where
//! no coordination backend is configured; it provides no real exclusion and
//! says so loudly.

pub mod backend;
pub mod error;
pub mod lock;

pub use backend::{FileLeaseBackend, Lease, LeaseBackend, MemoryLeaseBackend, PutOutcome};
pub use error::LockError;
pub use lock::{
    lock_from_config, HeldLock, LeaseLock, LockConfig, NoopLock, PipelineLock, DEFAULT_LOCK_ID,
    DEFAULT_POLL_INTERVAL, DEFAULT_TTL, DEFAULT_WAIT_BUDGET,
};
