pub mod checks;
pub mod run;
pub mod serve;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use scorecard_core::{config, CheckContext, CheckRegistry, ChecksConfig};

/// Resolve the checks file: an explicit path wins over `~/.scorecard/checks.yaml`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => config::default_path().context("could not locate the checks file"),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<ChecksConfig> {
    let path = config_path(explicit)?;
    config::load_at(&path)
        .with_context(|| format!("failed to load checks from {}", path.display()))
}

pub fn load_registry(explicit: Option<&Path>) -> Result<CheckRegistry> {
    let registry = scorecard_runner::registry_from_config(&load_config(explicit)?);
    registry.validate().context("invalid checks configuration")?;
    tracing::debug!(checks = registry.len(), "loaded check registry");
    Ok(registry)
}

/// Fresh context for one run, bounded by `timeout` seconds when given.
pub fn run_context(timeout: Option<u64>) -> CheckContext {
    let ctx = CheckContext::new();
    match timeout {
        Some(secs) => ctx.with_timeout(Duration::from_secs(secs)),
        None => ctx,
    }
}
