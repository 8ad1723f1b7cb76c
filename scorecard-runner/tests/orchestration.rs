//! Orchestrator behaviour: cardinality, failure isolation, cancellation,
//! input validation and invocation counts.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use scorecard_core::{
    check_fn, Check, CheckContext, CheckError, CheckRegistry, CheckReport, InvalidInput, Outcome,
    RepoUrl,
};
use scorecard_runner::{run, run_to_completion, RunError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn repo() -> RepoUrl {
    RepoUrl::parse("github.com/ossf/scorecard").expect("repo")
}

fn counted(name: &str, calls: Arc<AtomicUsize>) -> impl Check + 'static {
    check_fn(name.to_owned(), move |_ctx, _repo| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(CheckReport::pass().with_confidence(10)) }
    })
}

fn passing(name: &str) -> impl Check + 'static {
    check_fn(name.to_owned(), |_ctx, _repo| async { Ok(CheckReport::pass()) })
}

fn erroring(name: &str) -> impl Check + 'static {
    check_fn(name.to_owned(), |_ctx, _repo| async {
        Err::<CheckReport, _>(CheckError::failed("upstream API returned 502"))
    })
}

fn panicking(name: &str) -> impl Check + 'static {
    check_fn(name.to_owned(), |_ctx, _repo| async {
        if true {
            panic!("index out of bounds");
        }
        Ok(CheckReport::pass())
    })
}

/// Waits for cancellation like a well-behaved network check.
fn cooperative(name: &str) -> impl Check + 'static {
    check_fn(name.to_owned(), |ctx, _repo| async move {
        ctx.cancelled().await;
        Err::<CheckReport, _>(CheckError::Cancelled)
    })
}

/// Never completes and never looks at the context.
fn stuck(name: &str) -> impl Check + 'static {
    check_fn(name.to_owned(), |_ctx, _repo| async {
        std::future::pending::<()>().await;
        Ok(CheckReport::pass())
    })
}

fn sleeping(name: &str, millis: u64) -> impl Check + 'static {
    check_fn(name.to_owned(), move |_ctx, _repo| async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(CheckReport::pass())
    })
}

fn names(results: &[scorecard_core::CheckResult]) -> BTreeSet<String> {
    results.iter().map(|r| r.name.clone()).collect()
}

// ---------------------------------------------------------------------------
// Cardinality and ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_check_yields_exactly_one_result() {
    let registry: CheckRegistry = ["A", "B", "C", "D", "E"]
        .into_iter()
        .map(|n| Arc::new(passing(n)) as Arc<dyn Check>)
        .collect();

    let mut stream = run(&CheckContext::new(), repo(), &registry).expect("run");
    assert_eq!(stream.expected(), 5);

    let mut results = Vec::new();
    while let Some(result) = stream.next().await {
        results.push(result);
    }
    assert_eq!(results.len(), 5);
    assert_eq!(
        names(&results),
        ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| s.to_string())
            .collect::<BTreeSet<_>>()
    );
    assert!(results.iter().all(|r| r.is_pass()));
    assert!(stream.next().await.is_none(), "stream must stay closed");
}

#[tokio::test(start_paused = true, flavor = "current_thread")]
async fn results_arrive_in_completion_order() {
    let registry = CheckRegistry::new()
        .with(sleeping("Slow", 300))
        .with(sleeping("Fast", 10))
        .with(sleeping("Medium", 100));

    let results = run_to_completion(&CheckContext::new(), repo(), &registry)
        .await
        .expect("run");
    let order: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(order, vec!["Fast", "Medium", "Slow"]);
}

#[tokio::test]
async fn stream_implements_futures_stream() {
    let registry = CheckRegistry::new().with(passing("A")).with(erroring("B"));
    let stream = run(&CheckContext::new(), repo(), &registry).expect("run");
    let results: Vec<_> = stream.collect().await;
    assert_eq!(results.len(), 2);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_checks_never_affect_siblings() {
    const N: usize = 6;
    for failing in 1..=N {
        let mut registry = CheckRegistry::new();
        for i in 0..N {
            let name = format!("check-{i}");
            if i < failing {
                if i % 2 == 0 {
                    registry.push(panicking(&name));
                } else {
                    registry.push(erroring(&name));
                }
            } else {
                registry.push(passing(&name));
            }
        }

        let results = run_to_completion(&CheckContext::new(), repo(), &registry)
            .await
            .expect("run");
        assert_eq!(results.len(), N, "failing={failing}");

        for result in &results {
            let index: usize = result.name["check-".len()..].parse().expect("index");
            if index < failing {
                let detail = result.error_detail().unwrap_or_else(|| {
                    panic!("{} should have errored, got {:?}", result.name, result.outcome)
                });
                if index % 2 == 0 {
                    assert!(detail.contains("panicked"), "got: {detail}");
                    assert!(detail.contains("index out of bounds"), "got: {detail}");
                } else {
                    assert_eq!(detail, "upstream API returned 502");
                }
            } else {
                assert!(result.is_pass(), "{} should pass, failing={failing}", result.name);
            }
        }
    }
}

#[tokio::test]
async fn fail_verdict_is_not_an_error() {
    let registry = CheckRegistry::new().with(check_fn("Pinned-Dependencies", |_ctx, _repo| async {
        Ok(CheckReport::fail()
            .with_confidence(6)
            .with_explanation("3 unpinned actions"))
    }));
    let results = run_to_completion(&CheckContext::new(), repo(), &registry)
        .await
        .expect("run");
    assert_eq!(results[0].outcome, Outcome::Fail);
    assert_eq!(results[0].confidence, Some(6));
    assert_eq!(results[0].explanation.as_deref(), Some("3 unpinned actions"));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelling_before_completion_yields_all_cancelled() {
    let registry = CheckRegistry::new()
        .with(cooperative("A"))
        .with(stuck("B"))
        .with(cooperative("C"));
    let ctx = CheckContext::new();
    let stream = run(&ctx, repo(), &registry).expect("run");

    tokio::task::yield_now().await;
    ctx.cancel();

    let results = tokio::time::timeout(Duration::from_secs(5), stream.collect_all())
        .await
        .expect("stream must close promptly after cancellation");
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_cancelled()), "{results:?}");
    assert_eq!(names(&results).len(), 3);
}

#[tokio::test]
async fn cancelling_after_k_results_keeps_them() {
    let mut registry = CheckRegistry::new();
    for i in 0..3 {
        registry.push(passing(&format!("quick-{i}")));
    }
    for i in 0..4 {
        registry.push(stuck(&format!("stuck-{i}")));
    }

    let ctx = CheckContext::new();
    let mut stream = run(&ctx, repo(), &registry).expect("run");

    let mut results = Vec::new();
    for _ in 0..3 {
        results.push(stream.next().await.expect("quick result"));
    }
    ctx.cancel();
    while let Some(result) = stream.next().await {
        results.push(result);
    }

    assert_eq!(results.len(), 7);
    let passed: Vec<_> = results.iter().filter(|r| r.is_pass()).collect();
    let cancelled: Vec<_> = results.iter().filter(|r| r.is_cancelled()).collect();
    assert_eq!(passed.len(), 3);
    assert_eq!(cancelled.len(), 4);
    assert!(passed.iter().all(|r| r.name.starts_with("quick-")));
    assert!(cancelled.iter().all(|r| r.name.starts_with("stuck-")));
}

#[tokio::test(start_paused = true, flavor = "current_thread")]
async fn deadline_cancels_slow_checks() {
    let registry = CheckRegistry::new()
        .with(sleeping("Fast", 10))
        .with(sleeping("Slow", 60_000));
    let ctx = CheckContext::new().with_timeout(Duration::from_secs(1));

    let results = run_to_completion(&ctx, repo(), &registry)
        .await
        .expect("run");
    let fast = results.iter().find(|r| r.name == "Fast").expect("fast");
    let slow = results.iter().find(|r| r.name == "Slow").expect("slow");
    assert!(fast.is_pass());
    assert!(slow.is_cancelled());
}

#[tokio::test]
async fn already_cancelled_context_launches_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CheckRegistry::new()
        .with(counted("A", calls.clone()))
        .with(counted("B", calls.clone()));
    let ctx = CheckContext::new();
    ctx.cancel();

    let results = run_to_completion(&ctx, repo(), &registry)
        .await
        .expect("run");
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_cancelled()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_names_fail_fast_without_invoking_checks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CheckRegistry::new()
        .with(counted("Code-Review", calls.clone()))
        .with(counted("Fuzzing", calls.clone()))
        .with(counted("Code-Review", calls.clone()));

    let err = run(&CheckContext::new(), repo(), &registry).unwrap_err();
    assert!(
        matches!(
            err,
            RunError::InvalidInput(InvalidInput::DuplicateCheck { ref name }) if name == "Code-Review"
        ),
        "got: {err}"
    );

    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_registry_is_rejected() {
    let err = run(&CheckContext::new(), repo(), &CheckRegistry::new()).unwrap_err();
    assert!(matches!(err, RunError::InvalidInput(InvalidInput::EmptyRegistry)));
}

#[tokio::test]
async fn invalid_repo_is_rejected_before_launch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CheckRegistry::new().with(counted("A", calls.clone()));
    let bad = RepoUrl {
        host: "github.com".into(),
        owner: String::new(),
        name: "scorecard".into(),
    };

    let err = run(&CheckContext::new(), bad, &registry).unwrap_err();
    assert!(matches!(
        err,
        RunError::InvalidInput(InvalidInput::EmptyField { field: "owner" })
    ));
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Invocation cardinality
// ---------------------------------------------------------------------------

#[tokio::test]
async fn each_run_invokes_each_check_once() {
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));
    let registry = CheckRegistry::new()
        .with(counted("A", a.clone()))
        .with(counted("B", b.clone()));

    for _ in 0..2 {
        let results = run_to_completion(&CheckContext::new(), repo(), &registry)
            .await
            .expect("run");
        assert_eq!(results.len(), 2);
    }
    assert_eq!(a.load(Ordering::SeqCst), 2);
    assert_eq!(b.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn checks_see_the_same_repository() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut registry = CheckRegistry::new();
    for i in 0..4 {
        let seen = seen.clone();
        registry.push(check_fn(format!("probe-{i}"), move |_ctx, repo: RepoUrl| {
            seen.lock().expect("lock").push(repo.to_string());
            async { Ok(CheckReport::pass()) }
        }));
    }
    run_to_completion(&CheckContext::new(), repo(), &registry)
        .await
        .expect("run");

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|r| r == "github.com/ossf/scorecard"));
}
