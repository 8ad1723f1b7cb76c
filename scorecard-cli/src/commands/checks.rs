//! `scorecard checks` — inspect the configured checks.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use scorecard_core::ChecksConfig;

use super::{config_path, load_config};

#[derive(Subcommand, Debug)]
pub enum ChecksCommand {
    /// List configured checks in run order.
    List {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: ChecksCommand, config: Option<&Path>) -> Result<()> {
    match command {
        ChecksCommand::List { json } => list(config, json),
    }
}

#[derive(Serialize)]
struct CheckJson {
    name: String,
    command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "check")]
    name: String,
    #[tabled(rename = "command")]
    command: String,
    #[tabled(rename = "description")]
    description: String,
}

fn list(config: Option<&Path>, json: bool) -> Result<()> {
    let checks = load_config(config)?;
    if json {
        let payload: Vec<CheckJson> = checks
            .checks
            .into_iter()
            .map(|spec| CheckJson {
                name: spec.name,
                command: spec.command,
                description: spec.description,
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize checks JSON")?
        );
        return Ok(());
    }

    if checks.checks.is_empty() {
        println!("No checks configured in {}.", config_path(config)?.display());
        return Ok(());
    }
    println!("{}", table(&checks));
    Ok(())
}

fn table(checks: &ChecksConfig) -> Table {
    let rows: Vec<CheckRow> = checks
        .checks
        .iter()
        .map(|spec| CheckRow {
            name: spec.name.clone(),
            command: spec.command.join(" "),
            description: spec.description.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}
