//! Derive command implementation.
//!
//! Computes derived metrics for every profile of a packed profile and
//! writes the extended document back out.

use super::models::DeriveArgs;
use super::utils::{build_hotspots, build_metric_set, load_document, system_metadata};
use anyhow::{bail, Context, Result};
use log::{debug, info};

/// Metadata entry recording which derived metrics were added
pub const DERIVED_METADATA_KEY: &str = "autoperf:derived_metrics";

/// Execute the derive command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * No metric labels given
/// * Unresolvable metric set, or one wider than the document's metrics
/// * Expression evaluation failures
/// * File read/write errors
pub fn execute_derive(args: DeriveArgs) -> Result<()> {
    if args.metrics.is_empty() {
        bail!("At least one metric label is required");
    }

    let hotspots = build_hotspots(&args.hotspots)?;
    let mut doc = load_document(&args.input, &hotspots)?;

    let set = build_metric_set(&args.metrics, &args.spec_dirs)?;
    debug!(
        "Native metrics {:?}, derived metrics {:?}",
        set.native_metrics(),
        set.derived_metrics()
    );

    let meta = system_metadata(args.collect_sysinfo, &args.meta);
    doc.attach_metric_set(&set, &meta)
        .context("Failed to attach derived metrics")?;

    doc.insert_metadata(DERIVED_METADATA_KEY, set.derived_metrics().join(" "));
    doc.save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        "✓ Added {} derived metrics, written to: {}",
        set.derived_metrics().len(),
        args.output.display()
    );
    for metric in set.derived_metrics() {
        println!("{}", metric);
    }
    Ok(())
}
