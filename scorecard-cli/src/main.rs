//! Scorecard — run repository checks concurrently and report the results.
//!
//! # Usage
//!
//! ```text
//! scorecard serve [--port N] [--timeout SECS] [--templates DIR]
//! scorecard run <host/owner/name> [--checks a,b] [--timeout SECS] [--json]
//! scorecard checks list [--json]
//! ```
//!
//! Checks are read from `~/.scorecard/checks.yaml` unless `--config` (or
//! `SCORECARD_CONFIG`) names another file.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use commands::{checks::ChecksCommand, run::RunArgs, serve::ServeArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "scorecard",
    version,
    about = "Run repository health checks concurrently and report the results",
    long_about = None,
)]
struct Cli {
    /// Log verbosity; `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Checks file to load instead of `~/.scorecard/checks.yaml`.
    #[arg(long, global = true, env = "SCORECARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve results pages over HTTP.
    Serve(ServeArgs),

    /// Run every configured check against one repository.
    Run(RunArgs),

    /// Inspect the configured checks.
    Checks {
        #[command(subcommand)]
        command: ChecksCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    // Logs go to stderr so `run --json` output stays parseable.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Serve(args) => args.run(config).await,
        Commands::Run(args) => args.run(config).await,
        Commands::Checks { command } => commands::checks::run(command, config),
    }
}
