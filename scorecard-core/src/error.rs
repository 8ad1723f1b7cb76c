//! Error types for scorecard-core.

use std::path::PathBuf;

use thiserror::Error;

/// Input rejected before a run launches any check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    /// One of `host`, `owner` or `name` was empty.
    #[error("repository {field} must not be empty")]
    EmptyField { field: &'static str },

    /// The `host/owner/name` string did not split into exactly three segments.
    #[error("malformed repository '{input}': expected host/owner/name, got {segments} segment(s)")]
    MalformedRepo { input: String, segments: usize },

    /// The registry handed to a run contains no checks.
    #[error("check registry is empty")]
    EmptyRegistry,

    /// A registered check reported an empty name.
    #[error("check name must not be empty")]
    EmptyCheckName,

    /// Two checks in the same registry share a name.
    #[error("duplicate check name '{name}' in registry")]
    DuplicateCheck { name: String },

    /// A filter referenced a check the registry does not contain.
    #[error("unknown check '{name}'")]
    UnknownCheck { name: String },
}

/// Failure reported by a check implementation.
///
/// The orchestrator turns every variant into a result on the stream; none of
/// them aborts a run.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{0}")]
    Failed(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The check observed cancellation and gave up.
    #[error("check cancelled")]
    Cancelled,
}

impl CheckError {
    pub fn failed(message: impl Into<String>) -> Self {
        CheckError::Failed(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CheckError::Io {
            context: context.into(),
            source,
        }
    }
}

/// All errors that can arise while loading the check configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error; includes file path and line context from serde_yaml.
    #[error("failed to parse check config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("check config not found at {path}")]
    NotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None`, so `~/.scorecard/` cannot be located.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,

    /// Structurally valid YAML describing an unusable check.
    #[error("invalid check config: {0}")]
    Invalid(String),
}
