//! # foundry-pipeline
//!
//! The provisioning pipeline: one run takes the pipeline lock, loads the
//! state document, ensures the project's container exists, syncs the local
//! template tree into it, provisions the configured secret (best-effort),
//! persists the updated state, and releases the lock.
//!
//! Call [`run`] with explicit dependencies; nothing here reads ambient
//! environment state.

pub mod error;
pub mod runner;

pub use error::PipelineError;
pub use runner::{container_name_for, run, PipelineDeps, RunOutcome, RunRequest, SecretValue};
