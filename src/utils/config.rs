//! Configuration and constants for the PPK toolkit.
//!
//! Wire-format constants live here next to the TOML analysis
//! configuration that drives the CLI.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Magic cookie at the start of every packed profile
pub const PPK_COOKIE: [char; 3] = ['P', 'P', 'K'];

/// Highest compatibility level this decoder understands
pub const MAX_COMPATIBILITY: i32 = 2;

/// First format version carrying trial and thread metadata
pub const METADATA_VERSION: i32 = 2;

/// Byte used to fill the skip block on encode
pub const PAD_BYTE: u8 = 0x55;

/// Separator between frames of a call-path event name
pub const CALLPATH_SEPARATOR: &str = "=>";

/// Signature given to frames the profiler could not resolve
pub const UNRESOLVED: &str = "UNRESOLVED";

/// Name of the implicit root timer
pub const ROOT_EVENT: &str = ".TAU application";

/// Context marker wrapping the root timer in sampling mode
pub const TOPLEVEL_EVENT: &str = "[CONTEXT] .TAU application";

/// Tags marking sampling/unwinding bookkeeping entries
pub const DERIVED_TAGS: &[&str] = &["[SAMPLE]", "[UNWIND]", "[CONTEXT]", "[CALLSITE]", "[SUMMARY]"];

/// Default sampling interval for native metrics
pub const DEFAULT_SAMPLING_INTERVAL: u64 = 1000;

/// Prefix reserved for system metadata symbols
pub const META_PREFIX: &str = "META_";

/// Prefix of hardware counters supplied by PAPI
pub const NATIVE_PREFIX: &str = "PAPI_";

/// Native metrics that carry no prefix (compared upper-cased)
pub const NATIVE_NAMES: &[&str] = &["TIME"];

/// Current output schema version for JSON reports
pub const SCHEMA_VERSION: &str = "1.0.0";

/// How the comparison ranks events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// |b - a|
    #[default]
    Absolute,
    /// |b - a| / a
    Relative,
}

/// Settings of the two-run comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareSettings {
    #[serde(default)]
    pub mode: CompareMode,

    /// Events below this value in either run are dropped
    #[serde(default = "default_throttle")]
    pub throttle: f64,

    /// Number of events kept after ranking
    #[serde(default = "default_threshold")]
    pub threshold: usize,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            mode: CompareMode::Absolute,
            throttle: default_throttle(),
            threshold: default_threshold(),
        }
    }
}

fn default_throttle() -> f64 {
    1000.0
}

fn default_threshold() -> usize {
    10
}

/// Complete analysis configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Source-file patterns that bias short-name selection
    #[serde(default)]
    pub hotspots: Vec<String>,

    /// Directories searched for derived metric specifications
    #[serde(default)]
    pub spec_dirs: Vec<PathBuf>,

    /// Metric labels (`NAME[@interval]`) requested by the analysis
    #[serde(default)]
    pub metrics: Vec<String>,

    #[serde(default)]
    pub compare: CompareSettings,
}

impl AnalysisConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.compare.throttle.is_nan() {
            return Err(ConfigError::Invalid("compare.throttle is NaN".to_string()));
        }
        if let Some(label) = self.metrics.iter().find(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("empty metric label `{}`", label)));
        }
        Ok(())
    }
}

/// Load an analysis configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
/// * `ConfigError::Invalid` - If a value is out of range
///
/// # Example
/// ```ignore
/// let config = load_config("analysis.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse an analysis configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AnalysisConfig, ConfigError> {
    let config: AnalysisConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            hotspots = ["hot\\.c", "kernel"]
            spec_dirs = ["/opt/specs"]
            metrics = ["TIME", "IPC@5000"]

            [compare]
            mode = "relative"
            throttle = 10.0
            threshold = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.hotspots, vec!["hot\\.c", "kernel"]);
        assert_eq!(config.spec_dirs, vec![PathBuf::from("/opt/specs")]);
        assert_eq!(config.metrics.len(), 2);
        assert_eq!(config.compare.mode, CompareMode::Relative);
        assert_eq!(config.compare.throttle, 10.0);
        assert_eq!(config.compare.threshold, 3);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.hotspots.is_empty());
        assert_eq!(config.compare.mode, CompareMode::Absolute);
        assert_eq!(config.compare.throttle, 1000.0);
        assert_eq!(config.compare.threshold, 10);
    }

    #[test]
    fn test_blank_metric_label_rejected() {
        let result = parse_config(r#"metrics = ["TIME", "  "]"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = parse_config("[compare]\nmode = \"sideways\"");
        assert!(matches!(result, Err(ConfigError::ParseFailed(_))));
    }
}
