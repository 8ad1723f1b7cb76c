//! YAML check configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.scorecard/
//!   checks.yaml
//! ```
//!
//! ```yaml
//! checks:
//!   - name: Security-Policy
//!     description: SECURITY.md is present
//!     command: ["./checks/security-policy.sh"]
//!     env:
//!       GITHUB_TOKEN: "..."
//! ```
//!
//! Every loader has two forms, as elsewhere in this crate:
//! - `load_at(path)` takes an explicit file; used in tests with `TempDir`
//! - `load()` resolves [`default_path`] and delegates to `load_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_DIR: &str = ".scorecard";
pub const CONFIG_FILE: &str = "checks.yaml";

/// Root of `checks.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChecksConfig {
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

/// One externally implemented check: a program run once per repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// `<home>/.scorecard/checks.yaml` — pure, no I/O.
pub fn path_at(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// `path_at` for the current user's home directory.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| path_at(&home))
        .ok_or(ConfigError::HomeNotFound)
}

/// Load and check a config file.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path
/// and line context) if malformed, `ConfigError::Invalid` for empty commands.
pub fn load_at(path: &Path) -> Result<ChecksConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ChecksConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for spec in &config.checks {
        if spec.command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "check '{}' has an empty command",
                spec.name
            )));
        }
    }
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ChecksConfig, ConfigError> {
    load_at(&default_path()?)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
