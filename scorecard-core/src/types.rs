//! Domain types: repository identifier, check reports and check results.
//!
//! Everything here is immutable once built and serializable via serde.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// Upper bound of the confidence scale.
pub const MAX_CONFIDENCE: u8 = 10;

// ---------------------------------------------------------------------------
// Repository identifier
// ---------------------------------------------------------------------------

/// The repository a run evaluates, e.g. `github.com/ossf/scorecard`.
///
/// [`RepoUrl::new`], [`RepoUrl::parse`] and deserialization all validate.
/// A value assembled from its public fields is checked again by the runner
/// before any check launches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RepoUrlFields")]
pub struct RepoUrl {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoUrl {
    /// Build a validated identifier.
    pub fn new(
        host: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, InvalidInput> {
        let repo = RepoUrl {
            host: host.into(),
            owner: owner.into(),
            name: name.into(),
        };
        repo.validate()?;
        Ok(repo)
    }

    /// Parse `host/owner/name`. Exactly three non-empty segments are accepted.
    pub fn parse(input: &str) -> Result<Self, InvalidInput> {
        let trimmed = input.trim();
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() != 3 {
            return Err(InvalidInput::MalformedRepo {
                input: input.to_owned(),
                segments: if trimmed.is_empty() { 0 } else { segments.len() },
            });
        }
        RepoUrl::new(segments[0], segments[1], segments[2])
    }

    /// Reject identifiers with an empty component.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        for (field, value) in [
            ("host", &self.host),
            ("owner", &self.owner),
            ("name", &self.name),
        ] {
            if value.trim().is_empty() {
                return Err(InvalidInput::EmptyField { field });
            }
        }
        Ok(())
    }
}

/// Unvalidated wire form of [`RepoUrl`].
#[derive(Deserialize)]
struct RepoUrlFields {
    host: String,
    owner: String,
    name: String,
}

impl TryFrom<RepoUrlFields> for RepoUrl {
    type Error = InvalidInput;

    fn try_from(fields: RepoUrlFields) -> Result<Self, Self::Error> {
        RepoUrl::new(fields.host, fields.owner, fields.name)
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.name)
    }
}

impl FromStr for RepoUrl {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoUrl::parse(s)
    }
}

// ---------------------------------------------------------------------------
// What a check returns
// ---------------------------------------------------------------------------

/// Successful verdict of a single check, before the orchestrator attributes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CheckReport {
    pub fn pass() -> Self {
        Self {
            passed: true,
            confidence: None,
            explanation: None,
        }
    }

    pub fn fail() -> Self {
        Self {
            passed: false,
            ..Self::pass()
        }
    }

    /// Confidence on a 0..=10 scale; larger values are clamped.
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence.min(MAX_CONFIDENCE));
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Check result
// ---------------------------------------------------------------------------

/// Terminal state of one check within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    /// The check could not complete: it returned an error or panicked.
    Error { detail: String },
    /// The run was cancelled before the check finished.
    Cancelled,
}

impl Outcome {
    /// Short lowercase label, stable for JSON/HTML consumers.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Error { .. } => "error",
            Outcome::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Error { detail } => write!(f, "error: {detail}"),
            other => f.write_str(other.label()),
        }
    }
}

/// The result of exactly one check in exactly one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Wall time between unit start and completion; 0 for checks never launched.
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn from_report(name: impl Into<String>, report: CheckReport, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            outcome: if report.passed {
                Outcome::Pass
            } else {
                Outcome::Fail
            },
            confidence: report.confidence,
            explanation: report.explanation,
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn errored(name: impl Into<String>, detail: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            outcome: Outcome::Error {
                detail: detail.into(),
            },
            confidence: None,
            explanation: None,
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn cancelled(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            outcome: Outcome::Cancelled,
            confidence: None,
            explanation: None,
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.outcome, Outcome::Pass)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, Outcome::Cancelled)
    }

    pub fn error_detail(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Error { detail } => Some(detail),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
