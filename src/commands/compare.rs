//! Compare command implementation.
//!
//! The compare command:
//! 1. Loads both packed profiles
//! 2. Attaches derived metrics to both (if any label is derived)
//! 3. Ranks events per metric by how far their exclusive mean moved
//! 4. Prints tables and optionally writes JSON

use super::models::CompareArgs;
use super::utils::{
    build_hotspots, build_metric_set, load_document, metric_names, system_metadata,
};
use crate::compare::{compare_runs, render_text, CompareReport};
use crate::metrics::is_derived;
use crate::output::write_report;
use anyhow::{bail, Context, Result};
use log::info;

/// Execute the compare command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// One report per compared metric
pub fn execute_compare(args: CompareArgs) -> Result<Vec<CompareReport>> {
    if args.metrics.is_empty() {
        bail!("At least one metric is required");
    }

    let hotspots = build_hotspots(&args.hotspots)?;
    let mut baseline = load_document(&args.baseline, &hotspots)?;
    let mut target = load_document(&args.target, &hotspots)?;

    let names = metric_names(&args.metrics);
    if names.iter().any(|m| is_derived(m)) {
        let set = build_metric_set(&args.metrics, &args.spec_dirs)?;
        let meta = system_metadata(args.collect_sysinfo, &args.meta);
        baseline
            .attach_metric_set(&set, &meta)
            .context("Failed to attach derived metrics to the baseline")?;
        target
            .attach_metric_set(&set, &meta)
            .context("Failed to attach derived metrics to the target")?;
    }

    let baseline_label = args.baseline.display().to_string();
    let target_label = args.target.display().to_string();

    let reports: Vec<CompareReport> = names
        .iter()
        .map(|metric| {
            compare_runs(
                (&baseline, &baseline_label),
                (&target, &target_label),
                metric,
                &args.settings,
            )
        })
        .collect();

    for report in &reports {
        println!("{}", render_text(report));
    }

    if let Some(path) = &args.output_json {
        write_report(&reports, path).context("Failed to write comparison JSON")?;
        info!("✓ Comparison written to: {}", path.display());
    }

    Ok(reports)
}
