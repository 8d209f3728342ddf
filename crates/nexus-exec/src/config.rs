//! Executor configuration.
//!
//! Switches that let the physical plan generator skip an optimization. The
//! defaults turn everything on; turning a switch off never changes query
//! results, only the chosen operators.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};

/// Physical planning and execution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Use the hash join strategy for `field = field` join conditions.
    #[serde(default = "default_true")]
    pub enable_hash_join: bool,

    /// Turn table accesses with matching equality predicates into index scans.
    #[serde(default = "default_true")]
    pub enable_index_scan: bool,

    /// Column name of the single cell produced by EXPLAIN.
    #[serde(default = "default_explain_header")]
    pub explain_header: String,
}

fn default_true() -> bool {
    true
}

fn default_explain_header() -> String {
    "Query Plan".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            enable_hash_join: default_true(),
            enable_index_scan: default_true(),
            explain_header: default_explain_header(),
        }
    }
}

impl ExecutorConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serializes configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks the configuration for values the executor cannot use.
    pub fn validate(&self) -> ExecResult<()> {
        if self.explain_header.trim().is_empty() {
            return Err(ExecError::Config(
                "explain_header must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns a builder.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }
}

/// Builder for executor configuration.
#[derive(Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the hash join strategy.
    pub fn enable_hash_join(mut self, enabled: bool) -> Self {
        self.config.enable_hash_join = enabled;
        self
    }

    /// Enables or disables index selection.
    pub fn enable_index_scan(mut self, enabled: bool) -> Self {
        self.config.enable_index_scan = enabled;
        self
    }

    /// Sets the EXPLAIN column name.
    pub fn explain_header(mut self, header: impl Into<String>) -> Self {
        self.config.explain_header = header.into();
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}
