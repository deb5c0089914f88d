//! Error types for foundry-state.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from state persistence.
///
/// A blob that exists but fails to parse is NOT an error: `load` resets it
/// to an empty document with a warning, matching the recovery-over-failure
/// policy for state (the document is always re-derivable from a run).
#[derive(Debug, Error)]
pub enum StateError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// State document serialization error (save path).
    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the HTTP object store.
    #[error("state store HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection-level failure talking to the HTTP object store.
    #[error("state store transport error: {0}")]
    Transport(String),
}

/// Convenience constructor for [`StateError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.into(),
        source,
    }
}
