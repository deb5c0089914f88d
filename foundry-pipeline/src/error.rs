//! Error types for foundry-pipeline.

use std::time::Duration;

use thiserror::Error;

/// All errors that abort a pipeline run.
///
/// Secret-provisioning failures are absent on purpose: they are caught in
/// the runner, logged, and reported through
/// [`crate::RunOutcome::secret_warning`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration failure — happens before any mutation.
    #[error(transparent)]
    Config(#[from] foundry_core::ConfigError),

    /// Unexpected lock-backend fault.
    #[error(transparent)]
    Lock(#[from] foundry_lock::LockError),

    /// The wait budget elapsed while another run held the lease.
    #[error("unable to acquire pipeline lock within {}s; aborting", wait_budget.as_secs())]
    LockTimeout { wait_budget: Duration },

    /// State persistence failure.
    #[error(transparent)]
    State(#[from] foundry_state::StateError),

    /// Container API or template-tree failure.
    #[error(transparent)]
    Hub(#[from] foundry_hub::HubError),
}
