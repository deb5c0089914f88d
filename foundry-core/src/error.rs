//! Error types for foundry-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading and validating configuration.
///
/// Every variant fails a run before any remote mutation has happened.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The workspace file did not exist at the expected path.
    #[error("workspace file not found: {path}")]
    WorkspaceNotFound { path: PathBuf },

    /// Underlying I/O failure reading the workspace file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context.
    #[error("failed to parse workspace file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `project_name` was absent from both the workspace file and the
    /// explicit override.
    #[error("workspace file must contain project_name (or set it via override)")]
    MissingProjectName,

    /// A required credential or identifier was not provided.
    #[error("{name} must be set")]
    MissingSetting { name: &'static str },
}
