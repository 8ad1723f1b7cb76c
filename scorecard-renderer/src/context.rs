//! Page context — serializable rendering payload collected from a run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scorecard_core::{CheckResult, Outcome};

use crate::error::RenderError;

/// Everything the results page needs, keyed by check name.
///
/// Built empty with [`PageContext::new`] and filled one result at a time with
/// [`PageContext::record`] as the run streams them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    /// The `repo` parameter as requested.
    pub url: String,
    pub results: BTreeMap<String, ResultRow>,
    pub summary: SummaryCtx,
    pub meta: MetaCtx,
}

/// One rendered check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub status: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryCtx {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub scorecard_version: String,
    pub generated_at: DateTime<Utc>,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            results: BTreeMap::new(),
            summary: SummaryCtx::default(),
            meta: MetaCtx {
                scorecard_version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: Utc::now(),
            },
        }
    }

    /// Convenience for callers that already hold every result.
    pub fn from_results<'a>(
        url: impl Into<String>,
        results: impl IntoIterator<Item = &'a CheckResult>,
    ) -> Self {
        let mut ctx = Self::new(url);
        for result in results {
            ctx.record(result);
        }
        ctx
    }

    /// Add one result. A second result under the same name replaces the first
    /// without double counting.
    pub fn record(&mut self, result: &CheckResult) {
        let row = ResultRow {
            status: result.outcome.label().to_string(),
            passed: result.is_pass(),
            confidence: result.confidence,
            explanation: result.explanation.clone(),
            error: result.error_detail().map(str::to_owned),
            duration_ms: result.duration_ms,
        };
        if let Some(previous) = self.results.insert(result.name.clone(), row) {
            self.summary.adjust(&previous.status, -1);
        }
        self.summary.adjust(result.outcome.label(), 1);
        self.summary.total = self.results.len();
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        let value = serde_json::to_value(self)?;
        tera::Context::from_value(value).map_err(RenderError::from)
    }
}

impl SummaryCtx {
    fn adjust(&mut self, status: &str, delta: isize) {
        let slot = match status {
            s if s == Outcome::Pass.label() => &mut self.passed,
            s if s == Outcome::Fail.label() => &mut self.failed,
            s if s == Outcome::Cancelled.label() => &mut self.cancelled,
            _ => &mut self.errored,
        };
        *slot = slot.saturating_add_signed(delta);
    }
}
