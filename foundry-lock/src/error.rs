//! Error types for foundry-lock.

use std::path::PathBuf;

use thiserror::Error;

/// Unexpected faults from the lease backend.
///
/// Contention is not an error — backends report it through
/// [`crate::PutOutcome::Contended`], and `acquire` turns an exhausted wait
/// budget into `Ok(false)`.
#[derive(Debug, Error)]
pub enum LockError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Lease record serialization/deserialization error.
    #[error("lease JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`LockError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LockError {
    LockError::Io {
        path: path.into(),
        source,
    }
}
