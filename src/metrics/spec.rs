//! Derived metric specification files.
//!
//! A specification is a plain text file named after the derived metric,
//! holding one expression per line. Blank lines and `#` comments are
//! ignored. Files are searched across an ordered list of directories and
//! fall back to the specifications bundled with this crate.

use crate::utils::error::MetricSetError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Specifications compiled into the crate
const BUNDLED_SPECS: &[(&str, &str)] = &[
    ("IPC", include_str!("../../metric_spec/IPC")),
    ("CPI", include_str!("../../metric_spec/CPI")),
    ("L1_MISS_RATE", include_str!("../../metric_spec/L1_MISS_RATE")),
    ("L2_MISS_RATE", include_str!("../../metric_spec/L2_MISS_RATE")),
    ("FLOPS", include_str!("../../metric_spec/FLOPS")),
    ("BR_MISPRED_RATE", include_str!("../../metric_spec/BR_MISPRED_RATE")),
    ("INS_PER_CORE", include_str!("../../metric_spec/INS_PER_CORE")),
];

/// Ordered search path for specification files
#[derive(Debug, Clone)]
pub struct SpecLibrary {
    dirs: Vec<PathBuf>,
    bundled: bool,
}

impl Default for SpecLibrary {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SpecLibrary {
    /// Search `dirs` in order, then the bundled specifications
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs, bundled: true }
    }

    /// Search `dirs` only
    pub fn without_bundled(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            bundled: false,
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Names of the bundled specifications
    pub fn bundled_names() -> impl Iterator<Item = &'static str> {
        BUNDLED_SPECS.iter().map(|(name, _)| *name)
    }

    /// Expression lines defining `metric`
    ///
    /// # Errors
    /// * `MetricSetError::MissingMetricSpec` - no directory (nor the bundle) has it
    /// * `MetricSetError::Io` - a spec file exists but cannot be read
    pub fn lookup(&self, metric: &str) -> Result<Vec<String>, MetricSetError> {
        if !is_plain_file_name(metric) {
            return Err(MetricSetError::MissingMetricSpec(metric.to_string()));
        }

        for dir in &self.dirs {
            let path = dir.join(metric);
            if path.is_file() {
                debug!("Loading spec for {} from {}", metric, path.display());
                return read_spec_file(&path);
            }
        }

        if self.bundled {
            if let Some((_, text)) = BUNDLED_SPECS.iter().find(|(name, _)| *name == metric) {
                debug!("Using bundled spec for {}", metric);
                return Ok(parse_spec(text));
            }
        }

        Err(MetricSetError::MissingMetricSpec(metric.to_string()))
    }
}

fn read_spec_file(path: &Path) -> Result<Vec<String>, MetricSetError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_spec(&text))
}

/// Expression lines of a spec, without blanks and comments
pub fn parse_spec(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Metric names must not escape the spec directory
fn is_plain_file_name(metric: &str) -> bool {
    !metric.is_empty() && !metric.contains(['/', '\\']) && metric != "." && metric != ".."
}
