//! The [`Check`] contract and a closure adapter.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::context::CheckContext;
use crate::error::CheckError;
use crate::types::{CheckReport, RepoUrl};

/// A named, independently executable evaluation of a repository.
///
/// The orchestrator invokes [`Check::run`] at most once per run. A check that
/// does blocking I/O should await [`CheckContext::cancelled`] alongside it;
/// the orchestrator stops polling a cancelled check at its next await point
/// but cannot pre-empt synchronous work.
#[async_trait]
pub trait Check: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    async fn run(&self, ctx: &CheckContext, repo: &RepoUrl) -> Result<CheckReport, CheckError>;
}

/// A [`Check`] backed by an async closure.
pub struct FnCheck<F> {
    name: String,
    description: Option<String>,
    f: F,
}

impl<F> FnCheck<F> {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl<F> fmt::Debug for FnCheck<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCheck").field("name", &self.name).finish()
    }
}

/// Build a check from `f(ctx, repo)`.
///
/// ```rust,no_run
/// use scorecard_core::{check_fn, CheckReport};
///
/// let check = check_fn("Always-Pass", |_ctx, _repo| async { Ok(CheckReport::pass()) });
/// ```
pub fn check_fn<F, Fut>(name: impl Into<String>, f: F) -> FnCheck<F>
where
    F: Fn(CheckContext, RepoUrl) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CheckReport, CheckError>> + Send,
{
    FnCheck {
        name: name.into(),
        description: None,
        f,
    }
}

#[async_trait]
impl<F, Fut> Check for FnCheck<F>
where
    F: Fn(CheckContext, RepoUrl) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CheckReport, CheckError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    async fn run(&self, ctx: &CheckContext, repo: &RepoUrl) -> Result<CheckReport, CheckError> {
        (self.f)(ctx.clone(), repo.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fn_check_forwards_to_closure() {
        let check = check_fn("Owner-Is-Ossf", |_ctx, repo: RepoUrl| async move {
            if repo.owner == "ossf" {
                Ok(CheckReport::pass())
            } else {
                Ok(CheckReport::fail())
            }
        });
        let repo = RepoUrl::parse("github.com/ossf/scorecard").unwrap();
        let report = check.run(&CheckContext::new(), &repo).await.unwrap();
        assert!(report.passed);
        assert_eq!(check.name(), "Owner-Is-Ossf");
    }

    #[tokio::test]
    async fn fn_check_propagates_errors() {
        let check = check_fn("Broken", |_ctx, _repo| async {
            Err::<CheckReport, _>(CheckError::failed("api unavailable"))
        })
        .with_description("always errors");
        let repo = RepoUrl::parse("a/b/c").unwrap();
        let err = check.run(&CheckContext::new(), &repo).await.unwrap_err();
        assert_eq!(err.to_string(), "api unavailable");
        assert_eq!(check.description(), Some("always errors"));
    }
}
