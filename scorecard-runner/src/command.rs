//! Checks implemented by external programs.
//!
//! The program receives the repository through the environment:
//!
//! | Variable               | Value                  |
//! |------------------------|------------------------|
//! | `SCORECARD_REPO`       | `host/owner/name`      |
//! | `SCORECARD_REPO_HOST`  | `host`                 |
//! | `SCORECARD_REPO_OWNER` | `owner`                |
//! | `SCORECARD_REPO_NAME`  | `name`                 |
//!
//! Exit status 0 is a pass, 1 a fail, anything else an error. Stdout becomes
//! the explanation; an optional first line `confidence=N` sets the confidence.

use std::collections::BTreeMap;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use scorecard_core::{
    Check, CheckContext, CheckError, CheckRegistry, CheckReport, CheckSpec, ChecksConfig, RepoUrl,
};
use tokio::process::Command;

const STDERR_TAIL_LINES: usize = 3;

#[derive(Debug, Clone)]
pub struct CommandCheck {
    name: String,
    description: Option<String>,
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandCheck {
    /// `spec.command` must be non-empty; [`scorecard_core::config::load_at`]
    /// guarantees that for loaded configs.
    pub fn from_spec(spec: &CheckSpec) -> Self {
        let mut parts = spec.command.iter().cloned();
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            program: parts.next().unwrap_or_default(),
            args: parts.collect(),
            env: spec.env.clone(),
        }
    }

    fn command(&self, repo: &RepoUrl) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .env("SCORECARD_REPO", repo.to_string())
            .env("SCORECARD_REPO_HOST", &repo.host)
            .env("SCORECARD_REPO_OWNER", &repo.owner)
            .env("SCORECARD_REPO_NAME", &repo.name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Check for CommandCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn run(&self, ctx: &CheckContext, repo: &RepoUrl) -> Result<CheckReport, CheckError> {
        if self.program.is_empty() {
            return Err(CheckError::failed("empty command"));
        }
        let child = self
            .command(repo)
            .spawn()
            .map_err(|e| CheckError::io(format!("failed to spawn '{}'", self.program), e))?;

        // Dropping `wait_with_output` drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output
                .map_err(|e| CheckError::io(format!("failed to wait for '{}'", self.program), e))?,
            _ = ctx.cancelled() => {
                tracing::debug!(check = %self.name, "killing check process on cancellation");
                return Err(CheckError::Cancelled);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        interpret(output.status, &stdout, &stderr)
    }
}

/// Build a registry of [`CommandCheck`]s in config order.
pub fn registry_from_config(config: &ChecksConfig) -> CheckRegistry {
    config
        .checks
        .iter()
        .map(|spec| Arc::new(CommandCheck::from_spec(spec)) as Arc<dyn Check>)
        .collect()
}

fn interpret(status: ExitStatus, stdout: &str, stderr: &str) -> Result<CheckReport, CheckError> {
    let mut report = match status.code() {
        Some(0) => CheckReport::pass(),
        Some(1) => CheckReport::fail(),
        _ => {
            let tail = stderr_tail(stderr);
            return Err(CheckError::failed(if tail.is_empty() {
                format!("check process {status}")
            } else {
                format!("check process {status}: {tail}")
            }));
        }
    };

    let (confidence, explanation) = parse_stdout(stdout);
    if let Some(confidence) = confidence {
        report = report.with_confidence(confidence);
    }
    if let Some(explanation) = explanation {
        report = report.with_explanation(explanation);
    }
    Ok(report)
}

fn parse_stdout(stdout: &str) -> (Option<u8>, Option<String>) {
    let mut body = stdout.trim();
    let mut confidence = None;

    let first = body.lines().next().unwrap_or_default();
    if let Some(value) = first.trim().strip_prefix("confidence=") {
        if let Ok(parsed) = value.trim().parse::<u8>() {
            confidence = Some(parsed);
            body = body[first.len()..].trim();
        }
    }

    let explanation = (!body.is_empty()).then(|| body.to_owned());
    (confidence, explanation)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
