//! Foundry core library — domain types, workspace configuration, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes, [`StateDocument`] and per-project records
//! - [`config`] — `workspace.yaml` loading and defaulting
//! - [`slug`] — container-name derivation from project names
//! - [`time`] — injectable clock for poll/retry loops
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod slug;
pub mod time;
pub mod types;

pub use config::WorkspaceConfig;
pub use error::ConfigError;
pub use slug::slugify;
pub use time::{Clock, ManualClock, SystemClock};
pub use types::{ContainerName, ProjectName, ProjectRecord, StateDocument};
