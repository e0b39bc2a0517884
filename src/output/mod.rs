//! Output writers for analysis reports.
//!
//! This module handles writing data to disk:
//! - JSON reports (pretty printed)
//! - Report schemas for document summaries and statistics

pub mod json;
pub mod schema;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report};
pub use schema::{DocumentSummary, EventStats, StatsReport};
