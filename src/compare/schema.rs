//! Schema definitions for comparison reports.
//!
//! Defines the structures that represent how two runs differ per event.

use crate::utils::config::CompareMode;
use serde::{Deserialize, Serialize};

/// Complete report comparing a baseline run with a target run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareReport {
    /// Schema version for the report format
    pub schema_version: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Metric the events were compared on
    pub metric: String,

    /// Ranking rule used for `difference`
    pub mode: CompareMode,

    /// Events below this mean in either run were dropped
    pub throttle: f64,

    /// Maximum number of entries kept
    pub threshold: usize,

    pub baseline: RunInfo,

    pub target: RunInfo,

    /// Compared events, largest difference first
    pub entries: Vec<EventComparison>,

    pub summary: CompareSummary,
}

/// Identity of one compared run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunInfo {
    /// Caller-supplied label, usually the profile path
    pub label: String,

    /// Aggregated events in the run
    pub event_count: usize,

    /// Threads in the run
    pub thread_count: usize,
}

/// Exclusive means of one event in both runs
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EventComparison {
    /// Event short name
    pub event: String,

    /// Mean in the baseline run (0 if absent)
    pub baseline: f64,

    /// Mean in the target run (0 if absent)
    pub target: f64,

    /// Absolute or relative difference, per `mode`
    pub difference: f64,
}

/// Counts describing how the entries were selected
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompareSummary {
    /// Events present in either run
    pub events_compared: usize,

    /// Events dropped by the throttle
    pub events_throttled: usize,

    /// Entries in the report
    pub events_reported: usize,
}
