//! Core comparison engine.
//! Ranks the events of two runs by how much their exclusive mean moved.

use super::schema::{CompareReport, CompareSummary, EventComparison, RunInfo};
use crate::aggregator::Statistic;
use crate::store::{Document, Flavor};
use crate::utils::config::{CompareMode, CompareSettings, SCHEMA_VERSION};
use chrono::Utc;
use log::{debug, warn};

/// Compare two runs on one metric
///
/// Events are the union of both runs' aggregated events. An event missing
/// from one run reads 0 there. Events whose mean is below the throttle in
/// either run are dropped, the rest are ranked by difference and cut to
/// the threshold.
///
/// # Arguments
/// * `baseline` - run A, with its label
/// * `target` - run B, with its label
/// * `metric` - metric to compare on
/// * `settings` - mode, throttle and threshold
///
/// # Example
/// ```ignore
/// let a = Document::load("a.ppk", &hotspots)?;
/// let b = Document::load("b.ppk", &hotspots)?;
/// let report = compare_runs((&a, "a.ppk"), (&b, "b.ppk"), "TIME", &CompareSettings::default());
/// ```
pub fn compare_runs(
    baseline: (&Document, &str),
    target: (&Document, &str),
    metric: &str,
    settings: &CompareSettings,
) -> CompareReport {
    let (a, a_label) = baseline;
    let (b, b_label) = target;

    if !a.metrics().iter().any(|m| m == metric) && !b.metrics().iter().any(|m| m == metric) {
        warn!("Metric {} is recorded in neither run", metric);
    }

    let events = union_events(a.aggregate_events(), b.aggregate_events());
    let compared = events.len();

    let mut entries: Vec<EventComparison> = events
        .into_iter()
        .map(|event| {
            let a_mean = a.aggregate(&event, metric, Statistic::Mean, Flavor::Exclusive);
            let b_mean = b.aggregate(&event, metric, Statistic::Mean, Flavor::Exclusive);
            EventComparison {
                difference: difference(a_mean, b_mean, settings.mode),
                baseline: a_mean,
                target: b_mean,
                event,
            }
        })
        .filter(|entry| entry.baseline >= settings.throttle && entry.target >= settings.throttle)
        .collect();
    let throttled = compared - entries.len();

    entries.sort_by(|x, y| y.difference.total_cmp(&x.difference));
    entries.truncate(settings.threshold);
    debug!(
        "Compared {} events on {}: {} throttled, {} reported",
        compared,
        metric,
        throttled,
        entries.len()
    );

    CompareReport {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        metric: metric.to_string(),
        mode: settings.mode,
        throttle: settings.throttle,
        threshold: settings.threshold,
        baseline: run_info(a, a_label),
        target: run_info(b, b_label),
        summary: CompareSummary {
            events_compared: compared,
            events_throttled: throttled,
            events_reported: entries.len(),
        },
        entries,
    }
}

/// `|b - a|`, or `|b - a| / a` with a zero `a` treated as 1
pub fn difference(a: f64, b: f64, mode: CompareMode) -> f64 {
    let diff = (b - a).abs();
    match mode {
        CompareMode::Absolute => diff,
        CompareMode::Relative if a == 0.0 => diff,
        CompareMode::Relative => diff / a,
    }
}

/// `a` in order, then whatever `b` adds
fn union_events(a: &[String], b: &[String]) -> Vec<String> {
    let mut events = a.to_vec();
    for event in b {
        if !events.contains(event) {
            events.push(event.clone());
        }
    }
    events
}

fn run_info(doc: &Document, label: &str) -> RunInfo {
    RunInfo {
        label: label.to_string(),
        event_count: doc.aggregate_events().len(),
        thread_count: doc.threads().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_modes() {
        assert_eq!(difference(10.0, 4.0, CompareMode::Absolute), 6.0);
        assert_eq!(difference(10.0, 15.0, CompareMode::Relative), 0.5);
        assert_eq!(difference(0.0, 3.0, CompareMode::Relative), 3.0);
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["z".to_string(), "x".to_string()];
        assert_eq!(union_events(&a, &b), vec!["x", "y", "z"]);
    }
}
