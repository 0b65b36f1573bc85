use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{DiscoveryParams, IndependenceTest};
use crate::error::{OrientError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_test")]
    pub test: String,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// `-1` conditions on up to all other variables.
    #[serde(default = "default_depth")]
    pub depth: i64,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_true")]
    pub allow_cpu_fallback: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            test: default_test(),
            alpha: default_alpha(),
            depth: default_depth(),
            gamma: default_gamma(),
            allow_cpu_fallback: default_true(),
        }
    }
}

impl DiscoveryConfig {
    /// Resolve the configured test, rejecting unknown and unsupported ids.
    ///
    /// # Errors
    ///
    /// See [`IndependenceTest::parse_supported`].
    pub fn test(&self) -> Result<IndependenceTest> {
        IndependenceTest::parse_supported(&self.test)
    }

    /// Validate the numeric parameters for `n_vars` variables.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryParams::resolve`].
    pub fn params(&self, n_vars: usize) -> Result<DiscoveryParams> {
        DiscoveryParams::resolve(self.alpha, self.depth, self.gamma, n_vars)
    }
}

/// Load an engine config from a TOML file.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// [`OrientError::ConfigParse`] when the file exists but cannot be read or
/// parsed.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config file absent; using defaults");
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|err| OrientError::ConfigParse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    parse_config(&content).map_err(|reason| OrientError::ConfigParse {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_config(content: &str) -> std::result::Result<EngineConfig, String> {
    toml::from_str::<EngineConfig>(content).map_err(|err| err.to_string().trim_end().to_string())
}

fn default_test() -> String {
    IndependenceTest::FisherZ.identifier().to_string()
}

const fn default_alpha() -> f64 {
    0.05
}

const fn default_depth() -> i64 {
    DiscoveryParams::ALL_VARIABLES
}

const fn default_gamma() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}
