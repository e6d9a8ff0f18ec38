//! Analysis configuration
//!
//! Values come from defaults, then an optional `queuestat.toml`, then CLI
//! flags. Nothing is kept in process-wide state; the resolved config is
//! passed to the pipeline explicitly.
//!
//! # Example queuestat.toml
//!
//! ```toml
//! threshold = 6
//! top = 5
//! include_timeline = true
//! filters = ["type=REPORT", "project~^acme-"]
//! ```

use crate::concurrency::DEFAULT_THRESHOLD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for one analysis run
///
/// # Example
/// ```
/// use queuestat::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.threshold, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Concurrency level at or above which a window is reported
    ///
    /// 0 is accepted: every level qualifies and the whole observed range
    /// becomes a single window.
    pub threshold: usize,

    /// Rows shown per categorical breakdown in text output
    pub top: usize,

    /// Include the per-group timeline in JSON output
    pub include_timeline: bool,

    /// Filter expressions applied before analysis (see `TaskFilter`)
    pub filters: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top: 10,
            include_timeline: false,
            filters: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top == 0 {
            return Err("top must be >= 1".to_string());
        }

        Ok(())
    }
}
