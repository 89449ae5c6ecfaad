//! Comparison configuration loaded from YAML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! layout produced by the reference generator:
//!
//! ```yaml
//! discovery:
//!   example_prefix: Example
//!   save_subdir: Save
//! log_file: comparison_results.txt
//! strict_pairing: false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};

/// Top-level comparison configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Append-only discrepancy log shared by every comparison in a run
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Report references present in only one tree instead of skipping them
    #[serde(default)]
    pub strict_pairing: bool,
}

/// Where reference outputs live inside a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Directories whose name starts with this prefix hold notebook outputs
    #[serde(default = "default_example_prefix")]
    pub example_prefix: String,
    /// Fixed subfolder of each example directory holding the saved files
    #[serde(default = "default_save_subdir")]
    pub save_subdir: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("comparison_results.txt")
}

fn default_example_prefix() -> String {
    "Example".to_string()
}

fn default_save_subdir() -> String {
    "Save".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            example_prefix: default_example_prefix(),
            save_subdir: default_save_subdir(),
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            log_file: default_log_file(),
            strict_pairing: false,
        }
    }
}

impl CompareConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: CompareConfig =
            serde_yaml::from_str(content).map_err(|e| CompareError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.discovery.example_prefix.is_empty() {
            return Err(CompareError::Config(
                "discovery.example_prefix must not be empty".to_string(),
            ));
        }

        let save = &self.discovery.save_subdir;
        if save.is_empty() || save.contains('/') || save.contains('\\') {
            return Err(CompareError::Config(format!(
                "discovery.save_subdir must be a single directory name, got '{}'",
                save
            )));
        }

        if self.log_file.as_os_str().is_empty() {
            return Err(CompareError::Config("log_file must not be empty".to_string()));
        }

        Ok(())
    }
}
