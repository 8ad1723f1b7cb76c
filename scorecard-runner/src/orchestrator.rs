//! Fan-out / fan-in check orchestration.
//!
//! One coordinator task per run owns a [`JoinSet`] with one unit per check.
//! Each unit moves `Pending -> Running -> {Completed, Errored, Cancelled}` and
//! hands exactly one [`CheckResult`] back to the coordinator, which forwards
//! it on a channel sized to the registry so units never wait on a slow
//! consumer. The channel's single sender lives in the coordinator; it is
//! dropped, closing the stream, once every check has a result.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use scorecard_core::{
    Check, CheckContext, CheckError, CheckRegistry, CheckResult, Outcome, RepoUrl,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::RunError;
use crate::stream::ResultStream;

/// Start a run of `checks` against `repo`.
///
/// Input problems (malformed repository, empty registry, blank or duplicate
/// check names) are returned here and nothing is launched. Otherwise every
/// check runs concurrently and the returned stream yields one result per
/// check, in completion order. Cancelling `ctx` (or passing its deadline)
/// ends the run early: checks that have not finished are reported as
/// [`Outcome::Cancelled`].
///
/// Must be called from within a tokio runtime.
pub fn run(
    ctx: &CheckContext,
    repo: RepoUrl,
    checks: &CheckRegistry,
) -> Result<ResultStream, RunError> {
    repo.validate()?;
    checks.validate()?;
    let handle = tokio::runtime::Handle::try_current().map_err(|_| RunError::NoRuntime)?;

    let expected = checks.len();
    let (tx, rx) = mpsc::channel(expected);
    let units: Vec<Arc<dyn Check>> = checks.iter().cloned().collect();
    let span = tracing::info_span!("run", repo = %repo, checks = expected);

    handle.spawn(coordinate(ctx.child(), Arc::new(repo), units, tx).instrument(span));
    Ok(ResultStream::new(rx, expected))
}

/// [`run`] and wait for every result.
pub async fn run_to_completion(
    ctx: &CheckContext,
    repo: RepoUrl,
    checks: &CheckRegistry,
) -> Result<Vec<CheckResult>, RunError> {
    Ok(run(ctx, repo, checks)?.collect_all().await)
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Finished,
    Cancelled,
    Detached,
}

#[derive(Debug, Default)]
struct Tally {
    passed: usize,
    failed: usize,
    errored: usize,
    cancelled: usize,
}

impl Tally {
    fn record(&mut self, result: &CheckResult) {
        match result.outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Fail => self.failed += 1,
            Outcome::Error { .. } => self.errored += 1,
            Outcome::Cancelled => self.cancelled += 1,
        }
    }
}

struct Emitter {
    tx: mpsc::Sender<CheckResult>,
    tally: Tally,
}

impl Emitter {
    /// `false` once the consumer has dropped the stream.
    async fn emit(&mut self, result: CheckResult) -> bool {
        self.tally.record(&result);
        self.tx.send(result).await.is_ok()
    }
}

async fn coordinate(
    ctx: CheckContext,
    repo: Arc<RepoUrl>,
    checks: Vec<Arc<dyn Check>>,
    tx: mpsc::Sender<CheckResult>,
) {
    let started = Instant::now();
    let mut out = Emitter {
        tx,
        tally: Tally::default(),
    };
    let mut units: JoinSet<(usize, CheckResult)> = JoinSet::new();
    let mut pending: BTreeMap<usize, String> = BTreeMap::new();

    tracing::info!("run started");

    for (index, check) in checks.into_iter().enumerate() {
        if ctx.is_cancelled() {
            let name = check.name().to_owned();
            tracing::debug!(check = %name, "run cancelled before launch");
            if !out.emit(CheckResult::cancelled(name, 0)).await {
                return detach(&ctx, units);
            }
            continue;
        }
        pending.insert(index, check.name().to_owned());
        let unit_ctx = ctx.clone();
        let repo = Arc::clone(&repo);
        units.spawn(async move { (index, execute(check, unit_ctx, repo).await) });
    }

    let mut stop = Stop::Finished;
    while !units.is_empty() {
        tokio::select! {
            biased;
            Some(joined) = units.join_next() => match joined {
                Ok((index, result)) => {
                    pending.remove(&index);
                    if !out.emit(result).await {
                        stop = Stop::Detached;
                        break;
                    }
                }
                Err(err) => {
                    // Panics are caught inside the unit; this is an abort from outside.
                    tracing::error!(error = %err, "check unit terminated without a result");
                }
            },
            _ = ctx.cancelled() => {
                stop = Stop::Cancelled;
                break;
            }
            _ = out.tx.closed() => {
                stop = Stop::Detached;
                break;
            }
        }
    }

    if stop == Stop::Detached {
        return detach(&ctx, units);
    }

    if stop == Stop::Cancelled {
        tracing::info!(outstanding = pending.len(), "run cancelled");
        // Results that finished before the cancellation still count.
        while let Some(joined) = units.try_join_next() {
            if let Ok((index, result)) = joined {
                pending.remove(&index);
                if !out.emit(result).await {
                    return detach(&ctx, units);
                }
            }
        }
        units.abort_all();
    }

    let elapsed = millis(started.elapsed());
    for (_, name) in std::mem::take(&mut pending) {
        let result = match stop {
            Stop::Cancelled => CheckResult::cancelled(name, elapsed),
            _ => CheckResult::errored(name, "check unit terminated without a result", elapsed),
        };
        if !out.emit(result).await {
            return detach(&ctx, units);
        }
    }

    tracing::info!(
        passed = out.tally.passed,
        failed = out.tally.failed,
        errored = out.tally.errored,
        cancelled = out.tally.cancelled,
        duration_ms = elapsed,
        "run completed",
    );
    // `out` drops here, closing the stream.
}

fn detach(ctx: &CheckContext, mut units: JoinSet<(usize, CheckResult)>) {
    tracing::debug!(
        outstanding = units.len(),
        "result stream dropped by consumer; aborting run"
    );
    ctx.cancel();
    units.abort_all();
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

async fn execute(check: Arc<dyn Check>, ctx: CheckContext, repo: Arc<RepoUrl>) -> CheckResult {
    let name = check.name().to_owned();
    let started = Instant::now();
    tracing::debug!(check = %name, "check started");

    let outcome = AssertUnwindSafe(check.run(&ctx, &repo))
        .catch_unwind()
        .await;
    let elapsed = millis(started.elapsed());

    let result = match outcome {
        Ok(Ok(report)) => CheckResult::from_report(name, report, elapsed),
        Ok(Err(CheckError::Cancelled)) => CheckResult::cancelled(name, elapsed),
        Ok(Err(err)) => {
            tracing::warn!(check = %name, error = %err, "check returned an error");
            CheckResult::errored(name, err.to_string(), elapsed)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(check = %name, panic = %message, "check panicked");
            CheckResult::errored(name, format!("check panicked: {message}"), elapsed)
        }
    };

    tracing::debug!(
        check = %result.name,
        outcome = result.outcome.label(),
        duration_ms = result.duration_ms,
        "check finished",
    );
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use scorecard_core::{check_fn, CheckReport};

    fn repo() -> RepoUrl {
        RepoUrl::parse("github.com/ossf/scorecard").expect("repo")
    }

    #[test]
    fn panic_message_handles_both_payload_kinds() {
        let static_str: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(static_str.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }

    #[test]
    fn run_outside_runtime_is_rejected() {
        let registry = CheckRegistry::new()
            .with(check_fn("A", |_ctx, _repo| async { Ok(CheckReport::pass()) }));
        let err = run(&CheckContext::new(), repo(), &registry).unwrap_err();
        assert!(matches!(err, RunError::NoRuntime), "got: {err}");
    }

    #[tokio::test]
    async fn unit_converts_check_error_into_error_outcome() {
        let check: Arc<dyn Check> = Arc::new(check_fn("Broken", |_ctx, _repo| async {
            Err::<CheckReport, _>(CheckError::failed("rate limited"))
        }));
        let result = execute(check, CheckContext::new(), Arc::new(repo())).await;
        assert_eq!(result.error_detail(), Some("rate limited"));
    }

    #[tokio::test]
    async fn unit_reports_self_cancellation() {
        let check: Arc<dyn Check> = Arc::new(check_fn("Gives-Up", |_ctx, _repo| async {
            Err::<CheckReport, _>(CheckError::Cancelled)
        }));
        let result = execute(check, CheckContext::new(), Arc::new(repo())).await;
        assert!(result.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_stream_stops_running_checks() {
        let observed = CheckContext::new();
        let probe = observed.clone();
        let started = Arc::new(tokio::sync::Notify::new());
        let signal = Arc::clone(&started);
        let registry = CheckRegistry::new().with(check_fn("Slow", move |ctx, _repo| {
            // Fires when the check future finishes or is dropped.
            let guard = probe.token().clone().drop_guard();
            let signal = Arc::clone(&signal);
            async move {
                let _guard = guard;
                signal.notify_one();
                ctx.cancelled().await;
                Err::<CheckReport, _>(CheckError::Cancelled)
            }
        }));

        let caller = CheckContext::new();
        let stream = run(&caller, repo(), &registry).expect("run");
        tokio::time::timeout(Duration::from_secs(5), started.notified())
            .await
            .expect("check should start");
        assert!(!observed.is_cancelled());
        drop(stream);

        tokio::time::timeout(Duration::from_secs(5), observed.cancelled())
            .await
            .expect("check should observe cancellation after the stream is dropped");
        assert!(
            !caller.is_cancelled(),
            "dropping the stream must not cancel the caller's context"
        );
    }
}
