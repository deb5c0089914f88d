//! Lease records and the backend capability contract.
//!
//! A backend offers exactly two operations:
//! - a conditional write that succeeds when no lease exists for the lock id
//!   or the existing lease has expired,
//! - an unconditional delete by lock id.
//!
//! Release carries no owner token, so a holder that outlives its TTL can
//! delete a lease a second runner has since stolen. See DESIGN.md.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, LockError};

// ---------------------------------------------------------------------------
// Lease
// ---------------------------------------------------------------------------

/// One lease per lock id. Created on first acquire, refreshed when stolen
/// after expiry, deleted on release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub lock_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of the conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The lease was written; the caller now holds the lock.
    Acquired,
    /// A valid lease already exists for the lock id.
    Contended,
}

/// Backend capability contract: conditional put + unconditional delete.
pub trait LeaseBackend {
    /// Write `lease` iff no lease exists for its `lock_id` or the existing
    /// one has `expires_at` strictly before `now`.
    fn put_if_absent_or_expired(
        &self,
        lease: &Lease,
        now: DateTime<Utc>,
    ) -> Result<PutOutcome, LockError>;

    /// Delete any lease stored for `lock_id`. Deleting an absent lease is
    /// not an error.
    fn delete(&self, lock_id: &str) -> Result<(), LockError>;
}

impl<B: LeaseBackend + ?Sized> LeaseBackend for std::sync::Arc<B> {
    fn put_if_absent_or_expired(
        &self,
        lease: &Lease,
        now: DateTime<Utc>,
    ) -> Result<PutOutcome, LockError> {
        (**self).put_if_absent_or_expired(lease, now)
    }

    fn delete(&self, lock_id: &str) -> Result<(), LockError> {
        (**self).delete(lock_id)
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Lease backend storing one JSON file per lock id under a directory.
///
/// Suitable for runners sharing a filesystem. The steal path replaces the
/// lease via tmp + rename; when two stealers race, the last rename wins,
/// which matches the lease-steal semantics the contract allows (any caller
/// may take an expired lease).
#[derive(Debug)]
pub struct FileLeaseBackend {
    dir: PathBuf,
}

impl FileLeaseBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<lock_id>.json` — pure, no I/O.
    pub fn lease_path(&self, lock_id: &str) -> PathBuf {
        self.dir.join(format!("{lock_id}.json"))
    }

    fn read_lease(&self, path: &Path) -> Result<Option<Lease>, LockError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(path, e)),
        };
        match serde_json::from_str(&contents) {
            Ok(lease) => Ok(Some(lease)),
            Err(e) => {
                // An unreadable lease cannot be honored; treat it as absent
                // so a healthy runner can take over.
                tracing::warn!("discarding corrupt lease file {}: {e}", path.display());
                Ok(None)
            }
        }
    }
}

impl LeaseBackend for FileLeaseBackend {
    fn put_if_absent_or_expired(
        &self,
        lease: &Lease,
        now: DateTime<Utc>,
    ) -> Result<PutOutcome, LockError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let path = self.lease_path(&lease.lock_id);

        if let Some(existing) = self.read_lease(&path)? {
            if existing.expires_at >= now {
                return Ok(PutOutcome::Contended);
            }
        }

        let json = serde_json::to_string_pretty(lease)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(PutOutcome::Acquired)
    }

    fn delete(&self, lock_id: &str) -> Result<(), LockError> {
        let path = self.lease_path(lock_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(path, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Memory backend
// ---------------------------------------------------------------------------

/// In-process lease backend with truly atomic conditional writes.
///
/// Used by tests and single-process embeddings.
#[derive(Debug, Default)]
pub struct MemoryLeaseBackend {
    leases: Mutex<HashMap<String, Lease>>,
}

impl MemoryLeaseBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lease for `lock_id`, if any.
    pub fn lease(&self, lock_id: &str) -> Option<Lease> {
        self.leases
            .lock()
            .expect("lease map poisoned")
            .get(lock_id)
            .cloned()
    }

    /// Seed a lease directly (test setup).
    pub fn insert(&self, lease: Lease) {
        self.leases
            .lock()
            .expect("lease map poisoned")
            .insert(lease.lock_id.clone(), lease);
    }
}

impl LeaseBackend for MemoryLeaseBackend {
    fn put_if_absent_or_expired(
        &self,
        lease: &Lease,
        now: DateTime<Utc>,
    ) -> Result<PutOutcome, LockError> {
        let mut leases = self.leases.lock().expect("lease map poisoned");
        if let Some(existing) = leases.get(&lease.lock_id) {
            if existing.expires_at >= now {
                return Ok(PutOutcome::Contended);
            }
        }
        leases.insert(lease.lock_id.clone(), lease.clone());
        Ok(PutOutcome::Acquired)
    }

    fn delete(&self, lock_id: &str) -> Result<(), LockError> {
        self.leases
            .lock()
            .expect("lease map poisoned")
            .remove(lock_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
