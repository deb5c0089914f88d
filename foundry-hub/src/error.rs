//! Error types for foundry-hub.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from container API calls and sync.
#[derive(Debug, Error)]
pub enum HubError {
    /// Non-success response from the container API.
    #[error("container API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Rate-limit rejection, distinguished so retry policy can treat it as
    /// transient.
    #[error("container API rate limited ({status}): {body}")]
    RateLimited { status: u16, body: String },

    /// Connection-level failure before any HTTP status was received.
    #[error("container API transport error: {0}")]
    Transport(String),

    /// An I/O error reading the local template tree.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured template root does not exist.
    #[error("templates folder not found: {path}")]
    TemplatesMissing { path: PathBuf },

    /// A success response whose body did not decode as expected.
    #[error("container API returned malformed JSON: {0}")]
    Json(String),

    /// Public-key decoding or sealed-box encryption failure.
    #[error("secret encryption failed: {0}")]
    Encrypt(String),
}

impl HubError {
    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            HubError::RateLimited { .. } | HubError::Transport(_) => true,
            HubError::Api { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Classify a ureq failure, separating rate-limit rejections from other
    /// API errors.
    pub(crate) fn from_ureq(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status, response) => {
                let rate_limited = status == 429
                    || (status == 403
                        && response
                            .header("x-ratelimit-remaining")
                            .is_some_and(|v| v.trim() == "0"));
                let body = response.into_string().unwrap_or_default();
                if rate_limited {
                    HubError::RateLimited { status, body }
                } else {
                    HubError::Api { status, body }
                }
            }
            other => HubError::Transport(other.to_string()),
        }
    }
}

/// Convenience constructor for [`HubError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> HubError {
    HubError::Io {
        path: path.into(),
        source,
    }
}
