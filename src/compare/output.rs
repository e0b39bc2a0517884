//! Plain-text rendering of comparison reports.

use super::schema::CompareReport;

/// Render a comparison report as an aligned table
pub fn render_text(report: &CompareReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("Comparison on {} ({:?})\n", report.metric, report.mode));
    out.push_str("---------------------------------------------------\n");
    out.push_str(&format!("Baseline: {}\n", report.baseline.label));
    out.push_str(&format!("Target:   {}\n", report.target.label));
    out.push_str("---------------------------------------------------\n");

    if report.entries.is_empty() {
        out.push_str(&format!(
            "No event above the throttle ({}) in both runs\n",
            report.throttle
        ));
        return out;
    }

    let width = report
        .entries
        .iter()
        .map(|e| e.event.len())
        .max()
        .unwrap_or(0)
        .max("Event".len());

    out.push_str(&format!(
        "{:<width$}  {:>16}  {:>16}  {:>16}\n",
        "Event", "Baseline", "Target", "Difference"
    ));
    for entry in &report.entries {
        out.push_str(&format!(
            "{:<width$}  {:>16.3}  {:>16.3}  {:>16.3}\n",
            entry.event, entry.baseline, entry.target, entry.difference
        ));
    }

    out.push_str(&format!(
        "\n{} of {} events reported ({} below throttle)\n",
        report.summary.events_reported, report.summary.events_compared, report.summary.events_throttled
    ));
    out
}
