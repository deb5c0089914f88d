//! Pipeline run sequencing.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use foundry_core::config::WorkspaceConfig;
use foundry_core::slug::slugify;
use foundry_core::time::Clock;
use foundry_core::types::ProjectRecord;
use foundry_hub::{ContainerApi, SecretProvisioner, SyncEngine, SyncOptions};
use foundry_lock::{HeldLock, PipelineLock, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_BUDGET};
use foundry_state::StateStore;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// A secret resolved by the caller (name from config, value from wherever
/// the deployment keeps it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretValue {
    pub name: String,
    pub value: String,
}

/// Everything one run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub config: WorkspaceConfig,
    /// Local template tree to sync, already resolved to a concrete path.
    pub templates_root: PathBuf,
    /// Secret to provision after a successful sync; `None` skips the step.
    pub secret: Option<SecretValue>,
    pub wait_budget: Duration,
    pub poll_interval: Duration,
    pub sync_options: SyncOptions,
}

impl RunRequest {
    pub fn new(config: WorkspaceConfig) -> Self {
        let templates_root = PathBuf::from(&config.templates_folder);
        let sync_options = SyncOptions {
            exclusions: foundry_hub::ExclusionSet::with_extra(config.sync.exclude.clone()),
            ..SyncOptions::default()
        };
        Self {
            config,
            templates_root,
            secret: None,
            wait_budget: DEFAULT_WAIT_BUDGET,
            poll_interval: DEFAULT_POLL_INTERVAL,
            sync_options,
        }
    }

    pub fn with_secret(mut self, secret: Option<SecretValue>) -> Self {
        self.secret = secret;
        self
    }
}

/// Success summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub project_name: String,
    pub container_name: String,
    pub container_full_name: Option<String>,
    pub container_url: Option<String>,
    pub uploaded: Vec<String>,
    /// Set when secret provisioning failed; the run itself still succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_warning: Option<String>,
}

/// Collaborators injected by the caller.
pub struct PipelineDeps<'a> {
    pub lock: &'a dyn PipelineLock,
    pub state: &'a dyn StateStore,
    pub api: &'a dyn ContainerApi,
    pub clock: &'a dyn Clock,
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Derive the container name for a project from the configured naming
/// pattern. Only used when the state document has no recorded name yet.
pub fn container_name_for(config: &WorkspaceConfig) -> String {
    let slug = slugify(&config.project_name);
    [
        config.naming.prefix.as_str(),
        slug.as_str(),
        config.naming.suffix.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join("-")
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Execute one provisioning run.
///
/// The lock is released on every exit path once acquired, including early
/// returns from any later step.
pub fn run(request: &RunRequest, deps: &PipelineDeps<'_>) -> Result<RunOutcome, PipelineError> {
    let project_name = request.config.project_name.clone();
    tracing::info!("running provisioning pipeline for project '{project_name}'");

    let _held = HeldLock::acquire(deps.lock, request.wait_budget, request.poll_interval)?
        .ok_or(PipelineError::LockTimeout {
            wait_budget: request.wait_budget,
        })?;

    let mut state = deps.state.load()?;
    let recorded = state
        .projects
        .get(&project_name)
        .and_then(|record| record.container_name.clone());

    // A recorded name always wins over re-derivation: renames of the naming
    // rule must never orphan an existing container.
    let container_name =
        recorded.unwrap_or_else(|| container_name_for(&request.config));
    tracing::info!("target container for '{project_name}' is '{container_name}'");

    let engine = SyncEngine::with_options(deps.api, deps.clock, request.sync_options.clone());
    let info = engine.ensure_container(
        &container_name,
        &request.config.container_description(),
        request.config.private,
    )?;

    let report = engine.sync(&container_name, &request.templates_root)?;

    let secret_warning = match &request.secret {
        Some(secret) => {
            let provisioner = SecretProvisioner::new(deps.api);
            match provisioner.provision(&container_name, &secret.name, &secret.value) {
                Ok(()) => None,
                Err(e) => {
                    let warning =
                        format!("failed to provision secret '{}': {e}", secret.name);
                    tracing::warn!("{warning}");
                    Some(warning)
                }
            }
        }
        None => {
            tracing::debug!("no secret configured; skipping provisioning step");
            None
        }
    };

    state.upsert_project(
        &project_name,
        ProjectRecord {
            project_name: Some(project_name.clone()),
            container_name: Some(container_name.clone()),
            container_full_name: info.full_name.clone(),
            container_url: info.html_url.clone(),
            observability_enabled: request.config.observability.enabled,
            ..ProjectRecord::default()
        },
    );
    deps.state.save(&state)?;

    let outcome = RunOutcome {
        project_name,
        container_name,
        container_full_name: info.full_name,
        container_url: info.html_url,
        uploaded: report.uploaded,
        secret_warning,
    };
    tracing::info!(
        "pipeline completed successfully for '{}' ({} files)",
        outcome.project_name,
        outcome.uploaded.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use foundry_core::config::NamingConfig;

    use super::*;

    fn config(name: &str) -> WorkspaceConfig {
        WorkspaceConfig {
            version: 1,
            project_name: name.to_owned(),
            description: String::new(),
            private: true,
            observability: Default::default(),
            templates_folder: "templates".to_owned(),
            naming: NamingConfig::default(),
            sync: Default::default(),
            secret: Default::default(),
        }
    }

    #[test]
    fn container_name_is_plain_slug_by_default() {
        assert_eq!(container_name_for(&config("Acme Corp")), "acme-corp");
    }

    #[test]
    fn container_name_wraps_slug_in_prefix_and_suffix() {
        let mut cfg = config("Acme Corp");
        cfg.naming = NamingConfig {
            prefix: "org".to_owned(),
            suffix: "llm".to_owned(),
        };
        assert_eq!(container_name_for(&cfg), "org-acme-corp-llm");
    }

    #[test]
    fn empty_project_name_falls_back() {
        assert_eq!(container_name_for(&config("!!!")), "project");
    }
}
