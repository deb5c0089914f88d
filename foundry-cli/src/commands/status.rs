//! `foundry status` — provisioned-project visibility.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use foundry_core::types::StateDocument;
use foundry_state::state_from_config;

use crate::settings::Settings;

/// Arguments for `foundry status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let settings = Settings::from_env();
        let store = state_from_config(settings.state);
        let doc = store.load().context("failed to load state document")?;

        if self.json {
            print_json(&doc)?;
            return Ok(());
        }
        print_table(&doc);
        Ok(())
    }
}

#[derive(Serialize)]
struct ProjectStatusJson {
    project: String,
    container: Option<String>,
    url: Option<String>,
    observability: bool,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "container")]
    container: String,
    #[tabled(rename = "url")]
    url: String,
    #[tabled(rename = "observability")]
    observability: String,
}

fn print_json(doc: &StateDocument) -> Result<()> {
    let rows: Vec<ProjectStatusJson> = doc
        .projects
        .iter()
        .map(|(project, record)| ProjectStatusJson {
            project: project.clone(),
            container: record.container_name.clone(),
            url: record.container_url.clone(),
            observability: record.observability_enabled,
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&rows).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(doc: &StateDocument) {
    println!(
        "Foundry v{} | {} project(s) provisioned",
        env!("CARGO_PKG_VERSION"),
        doc.projects.len()
    );

    if doc.projects.is_empty() {
        println!("No projects provisioned yet. Run `foundry run` first.");
        return;
    }

    let rows: Vec<StatusTableRow> = doc
        .projects
        .iter()
        .map(|(project, record)| StatusTableRow {
            project: project.clone(),
            container: record
                .container_name
                .clone()
                .unwrap_or_else(|| "—".to_string()),
            url: record.container_url.clone().unwrap_or_else(|| "—".to_string()),
            observability: if record.observability_enabled {
                "on".green().to_string()
            } else {
                "off".bright_black().to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
