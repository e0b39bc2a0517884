//! Inspect command implementation.
//!
//! Decodes a packed profile and prints its structure: header, metadata,
//! metric/group/event tables and threads.

use super::models::InspectArgs;
use super::utils::{build_hotspots, load_document, render_call_path};
use crate::output::{write_report, DocumentSummary};
use crate::store::Document;
use crate::utils::indent::indent;
use anyhow::{Context, Result};
use log::info;

/// Execute the inspect command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or malformed packed profile
/// * Invalid hotspot pattern
/// * JSON write errors
pub fn execute_inspect(args: InspectArgs) -> Result<()> {
    let hotspots = build_hotspots(&args.hotspots)?;
    let doc = load_document(&args.input, &hotspots)?;

    print!("{}", render_document(&doc, args.show_events));

    if let Some(path) = &args.output_json {
        let summary = DocumentSummary::from_document(&doc, &args.input.display().to_string());
        write_report(&summary, path).context("Failed to write document summary")?;
        info!("✓ Summary written to: {}", path.display());
    }

    Ok(())
}

/// Human-readable structure of a document
pub fn render_document(doc: &Document, show_events: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "PPK version {} (compatibility {})\n",
        doc.version(),
        doc.compatibility()
    ));

    out.push_str(&format!("Metadata ({}):\n", doc.metadata().len()));
    for (name, value) in doc.metadata() {
        out.push_str(&format!("{}{}: {}\n", indent(1), name, value));
    }

    out.push_str(&format!("Metrics ({}):\n", doc.metrics().len()));
    for metric in doc.metrics() {
        out.push_str(&format!("{}{}\n", indent(1), metric));
    }

    out.push_str(&format!("Groups ({}):\n", doc.groups().len()));
    for group in doc.groups() {
        out.push_str(&format!("{}{}\n", indent(1), group));
    }

    let derived = doc.events().iter().filter(|e| e.is_derived).count();
    out.push_str(&format!(
        "Events ({}, {} derived, {} aggregated):\n",
        doc.events().len(),
        derived,
        doc.aggregate_events().len()
    ));
    if show_events {
        for (id, event) in doc.events().iter().enumerate() {
            let short = event.short_name.as_deref().unwrap_or("-");
            let marker = if event.is_derived { " (derived)" } else { "" };
            out.push_str(&format!("{}#{} {}{}\n", indent(1), id, short, marker));
            out.push_str(&render_call_path(event, 2));
        }
    }

    out.push_str(&format!("User events ({}):\n", doc.user_events().len()));
    for name in doc.user_events() {
        out.push_str(&format!("{}{}\n", indent(1), name));
    }

    out.push_str(&format!("Threads ({}):\n", doc.threads().len()));
    for thread in doc.threads() {
        out.push_str(&format!(
            "{}{}: {} function profiles, {} user event profiles\n",
            indent(1),
            thread.key(),
            thread.function_profiles().len(),
            thread.user_event_profiles().len()
        ));
        for (name, value) in thread.metadata() {
            out.push_str(&format!("{}{}: {}\n", indent(2), name, value));
        }
    }

    out
}
