//! Stats command implementation.
//!
//! The stats command:
//! 1. Loads the packed profile
//! 2. Attaches derived metrics (if requested)
//! 3. Reduces the metric across all threads per event
//! 4. Prints a table and optionally writes JSON

use super::models::StatsArgs;
use super::utils::{build_hotspots, build_metric_set, load_document, system_metadata};
use crate::output::{write_report, StatsReport};
use anyhow::{Context, Result};
use log::{info, warn};
use std::time::Instant;

/// Execute the stats command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or malformed packed profile
/// * Unresolvable derived metrics
/// * JSON write errors
pub fn execute_stats(args: StatsArgs) -> Result<()> {
    let start_time = Instant::now();
    let hotspots = build_hotspots(&args.hotspots)?;

    info!("Step 1/3: Loading {}...", args.input.display());
    let mut doc = load_document(&args.input, &hotspots)?;

    if args.derive.is_empty() {
        info!("Step 2/3: No derived metrics requested");
    } else {
        info!("Step 2/3: Attaching derived metrics {:?}...", args.derive);
        let set = build_metric_set(&args.derive, &args.spec_dirs)?;
        doc.attach_metric_set(&set, &system_metadata(args.collect_sysinfo, &args.meta))
            .context("Failed to attach derived metrics")?;
    }

    if !doc.metrics().iter().any(|m| *m == args.metric) {
        warn!(
            "Metric {} is not recorded; every statistic will read 0",
            args.metric
        );
    }

    info!("Step 3/3: Reducing {} ({})...", args.metric, args.flavor);
    let report = StatsReport::from_document(
        &doc,
        &args.input.display().to_string(),
        &args.metric,
        args.flavor,
        args.top,
    );

    print!("{}", render_stats(&report));

    if let Some(path) = &args.output_json {
        write_report(&report, path).context("Failed to write statistics JSON")?;
        info!("✓ Statistics written to: {}", path.display());
    }

    info!(
        "Stats completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Aligned table of a stats report
pub fn render_stats(report: &StatsReport) -> String {
    let width = report
        .events
        .iter()
        .map(|e| e.event.len())
        .max()
        .unwrap_or(0)
        .max("Event".len());

    let mut out = format!(
        "{} ({}) over {:?} nodes/contexts/threads\n",
        report.metric, report.flavor, report.thread_shape
    );
    out.push_str(&format!(
        "{:<width$}  {:>14}  {:>14}  {:>14}  {:>14}  {:>14}  {:>7}\n",
        "Event", "Sum", "Max", "Min", "StdDev", "Mean", "%"
    ));
    for e in &report.events {
        out.push_str(&format!(
            "{:<width$}  {:>14.3}  {:>14.3}  {:>14.3}  {:>14.3}  {:>14.3}  {:>6.1}%\n",
            e.event, e.sum, e.max, e.min, e.stddev, e.mean, e.percentage
        ));
    }
    out
}
