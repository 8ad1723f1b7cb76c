use scorecard_core::InvalidInput;
use thiserror::Error;

/// Run-level failures. Returned synchronously by [`crate::run`]; a run that
/// started never fails, it only emits results.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("no tokio runtime available to launch checks")]
    NoRuntime,
}
