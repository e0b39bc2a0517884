//! Two-run comparison of aggregated event means.
//!
//! # Example
//! ```ignore
//! use autoperf_ppk::compare::{compare_runs, render_text};
//!
//! let report = compare_runs((&a, "a.ppk"), (&b, "b.ppk"), "TIME", &settings);
//! println!("{}", render_text(&report));
//! ```

mod engine;
mod output;
mod schema;

pub use engine::{compare_runs, difference};
pub use output::render_text;
pub use schema::{CompareReport, CompareSummary, EventComparison, RunInfo};
