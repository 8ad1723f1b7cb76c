//! `scorecard run` — run every configured check against one repository.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use scorecard_core::{CheckResult, Outcome, RepoUrl};

use super::{load_registry, run_context};

/// Arguments for `scorecard run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Repository as `host/owner/name`.
    pub repo: String,

    /// Only run these checks (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub checks: Vec<String>,

    /// Cancel checks still running after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub async fn run(self, config: Option<&Path>) -> Result<()> {
        let repo = RepoUrl::parse(&self.repo)
            .with_context(|| format!("invalid repository '{}'", self.repo))?;
        let registry = load_registry(config)?
            .filter(&self.checks)
            .context("invalid --checks selection")?;

        let ctx = run_context(self.timeout);
        let interrupt = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received ctrl-c, cancelling run");
                interrupt.cancel();
            }
        });

        tracing::info!(repo = %repo, checks = registry.len(), "starting run");
        let mut stream = scorecard_runner::run(&ctx, repo.clone(), &registry)?;
        let mut results = Vec::with_capacity(stream.expected());
        while let Some(result) = stream.next().await {
            if !self.json {
                println!("{}", progress_line(&result));
            }
            results.push(result);
        }

        let summary = Summary::from_results(&results);
        if self.json {
            print_json(&repo, &results, &summary)?;
        } else {
            print_table(&repo, &results, &summary);
        }

        let not_passed = summary.total - summary.passed;
        if not_passed > 0 {
            bail!("{not_passed} of {} checks did not pass", summary.total);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
struct Summary {
    total: usize,
    passed: usize,
    failed: usize,
    errored: usize,
    cancelled: usize,
}

impl Summary {
    fn from_results(results: &[CheckResult]) -> Self {
        let mut summary = Summary {
            total: results.len(),
            ..Summary::default()
        };
        for result in results {
            match result.outcome {
                Outcome::Pass => summary.passed += 1,
                Outcome::Fail => summary.failed += 1,
                Outcome::Error { .. } => summary.errored += 1,
                Outcome::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

#[derive(Serialize)]
struct RunJson<'a> {
    repo: String,
    summary: &'a Summary,
    results: &'a [CheckResult],
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "check")]
    name: String,
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "confidence")]
    confidence: String,
    #[tabled(rename = "duration")]
    duration: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn outcome_indicator(outcome: &Outcome) -> String {
    let label = outcome.label().to_uppercase();
    match outcome {
        Outcome::Pass => label.green().to_string(),
        Outcome::Fail => label.red().to_string(),
        Outcome::Error { .. } => label.yellow().to_string(),
        Outcome::Cancelled => label.bright_black().to_string(),
    }
}

fn progress_line(result: &CheckResult) -> String {
    let mut line = format!(
        "{} {} ({} ms)",
        outcome_indicator(&result.outcome),
        result.name.bold(),
        result.duration_ms
    );
    if let Some(detail) = result.error_detail() {
        line.push_str(&format!(": {detail}"));
    }
    line
}

fn detail(result: &CheckResult) -> String {
    result
        .error_detail()
        .map(str::to_owned)
        .or_else(|| result.explanation.as_deref().and_then(|e| e.lines().next()).map(str::to_owned))
        .unwrap_or_default()
}

fn print_json(repo: &RepoUrl, results: &[CheckResult], summary: &Summary) -> Result<()> {
    let payload = RunJson {
        repo: repo.to_string(),
        summary,
        results,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize run JSON")?
    );
    Ok(())
}

fn print_table(repo: &RepoUrl, results: &[CheckResult], summary: &Summary) {
    let mut sorted: Vec<&CheckResult> = results.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    let rows: Vec<ResultRow> = sorted
        .into_iter()
        .map(|result| ResultRow {
            name: result.name.clone(),
            outcome: result.outcome.label().to_string(),
            confidence: result
                .confidence
                .map_or_else(|| "-".to_string(), |c| format!("{c}/10")),
            duration: format!("{} ms", result.duration_ms),
            detail: detail(result),
        })
        .collect();

    println!();
    println!("Scorecard Results for: {}", repo.to_string().bold());
    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
    println!(
        "{} passed | {} failed | {} errored | {} cancelled",
        summary.passed, summary.failed, summary.errored, summary.cancelled
    );
}
