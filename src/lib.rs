//! Autoperf PPK
//!
//! Decoding, aggregation and derived-metric analysis of packed profile
//! (PPK) files produced by HPC profiling runs.
//!
//! This crate provides the core implementation for the
//! `autoperf-ppk` CLI tool:
//!
//! - [`store`] decodes and encodes packed profiles
//! - [`aggregator`] reduces metrics across threads per event
//! - [`mathexp`] and [`metrics`] evaluate derived metric formulas
//! - [`compare`] ranks events between two runs
//!
//! ## Getting Started
//!
//! ```bash
//! autoperf-ppk inspect run.ppk --events
//! autoperf-ppk stats run.ppk --metric PAPI_TOT_CYC --top 10
//! autoperf-ppk derive run.ppk -o run.ipc.ppk --metric IPC
//! ```

pub mod aggregator;
pub mod codec;
pub mod commands;
pub mod compare;
pub mod mathexp;
pub mod metrics;
pub mod output;
pub mod parser;
pub mod store;
pub mod utils;
