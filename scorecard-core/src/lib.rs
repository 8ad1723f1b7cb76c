//! Scorecard core library — repository identifier, check contract, results,
//! registry and configuration.
//!
//! - [`types`] — [`RepoUrl`], [`CheckReport`], [`CheckResult`], [`Outcome`]
//! - [`check`] — the [`Check`] trait and [`check_fn`]
//! - [`context`] — [`CheckContext`] cancellation/deadline
//! - [`registry`] — [`CheckRegistry`]
//! - [`config`] — `checks.yaml` loading
//! - [`error`] — [`InvalidInput`], [`CheckError`], [`ConfigError`]

pub mod check;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod types;

pub use check::{check_fn, Check, FnCheck};
pub use config::{CheckSpec, ChecksConfig};
pub use context::CheckContext;
pub use error::{CheckError, ConfigError, InvalidInput};
pub use registry::CheckRegistry;
pub use types::{CheckReport, CheckResult, Outcome, RepoUrl};
