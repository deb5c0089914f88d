//! `foundry run` — execute the provisioning pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use foundry_core::time::{Clock, SystemClock};
use foundry_core::WorkspaceConfig;
use foundry_hub::{plan_local_tree, ExclusionSet, HubClient};
use foundry_lock::lock_from_config;
use foundry_pipeline::{run as run_pipeline, PipelineDeps, RunOutcome, RunRequest, SecretValue};
use foundry_state::state_from_config;

use crate::settings::Settings;

/// Arguments for `foundry run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the workspace configuration file.
    #[arg(long, default_value = "workspace.yaml")]
    pub workspace: PathBuf,

    /// Compute and print the sync plan without touching the remote.
    #[arg(long)]
    pub dry_run: bool,

    /// Where to write the machine-readable run summary.
    #[arg(long, default_value = "pipeline-output.json")]
    pub output: PathBuf,

    /// Seconds to keep retrying lock acquisition.
    #[arg(long, default_value_t = 60)]
    pub wait_secs: u64,

    /// Seconds between contended lock attempts.
    #[arg(long, default_value_t = 5)]
    pub poll_secs: u64,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let settings = Settings::from_env();
        let config = WorkspaceConfig::load(&self.workspace, settings.project_name_override.as_deref())
            .with_context(|| format!("failed to load {}", self.workspace.display()))?;

        if self.dry_run {
            return print_plan(&config);
        }

        let hub_config = Settings::hub_config().context("hub credentials missing")?;
        let client = HubClient::new(hub_config);

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let lock = lock_from_config(settings.lock.clone(), clock.clone());
        let state = state_from_config(settings.state.clone());

        let secret = Settings::secret_value(&config.secret.env).map(|value| SecretValue {
            name: config.secret.name.clone(),
            value,
        });

        let mut request = RunRequest::new(config).with_secret(secret);
        request.wait_budget = Duration::from_secs(self.wait_secs);
        request.poll_interval = Duration::from_secs(self.poll_secs);

        let deps = PipelineDeps {
            lock: lock.as_ref(),
            state: state.as_ref(),
            api: &client,
            clock: clock.as_ref(),
        };
        let outcome = run_pipeline(&request, &deps)?;

        print_outcome(&outcome);
        write_summary(&self.output, &outcome)?;
        Ok(())
    }
}

fn print_plan(config: &WorkspaceConfig) -> Result<()> {
    let root = PathBuf::from(&config.templates_folder);
    let exclusions = ExclusionSet::with_extra(config.sync.exclude.clone());
    let plan = plan_local_tree(&root, &exclusions)
        .with_context(|| format!("failed to plan sync of {}", root.display()))?;

    println!(
        "[dry-run] ✓ '{}' — {} file(s) would be synced",
        config.project_name,
        plan.len()
    );
    for entry in &plan {
        let marker = if entry.is_binary { "b" } else { "t" };
        println!("  ~  [{marker}] {}", entry.relative_path);
    }
    if plan.is_empty() {
        println!(
            "  (empty plan — is '{}' the right template root?)",
            config.templates_folder
        );
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    println!(
        "{} '{}' provisioned as '{}' ({} file(s) synced)",
        "✓".green().bold(),
        outcome.project_name,
        outcome.container_name,
        outcome.uploaded.len()
    );
    if let Some(url) = &outcome.container_url {
        println!("  →  {url}");
    }
    for path in &outcome.uploaded {
        println!("  ✎  {path}");
    }
    if let Some(warning) = &outcome.secret_warning {
        println!("  {}  {warning}", "⚠".yellow().bold());
    }
}

fn write_summary(path: &std::path::Path, outcome: &RunOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("failed to serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write summary to {}", path.display()))?;
    Ok(())
}
