use autoperf_ppk::compare::{compare_runs, render_text, CompareReport};
use autoperf_ppk::output::{read_report, write_report};
use autoperf_ppk::parser::{Event, Hotspots};
use autoperf_ppk::store::{Document, FunctionProfile, Profile, ThreadKey};
use autoperf_ppk::utils::config::{CompareMode, CompareSettings};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

/// One thread, exclusive TIME per event
fn run(times: &[(&str, f64)]) -> Document {
    let mut doc = Document::default();
    doc.add_metric("TIME");
    for (name, time) in times {
        let event_id = doc.add_event(Event::parse(name, &Hotspots::none()).unwrap());
        let mut profile = Profile::new(1.0, 0.0);
        profile.set("TIME", *time, *time);
        doc.add_function_profile(ThreadKey::new(0, 0, 0), FunctionProfile { event_id, profile })
            .unwrap();
    }
    doc.populate_aggregates();
    doc
}

fn settings(mode: CompareMode, throttle: f64, threshold: usize) -> CompareSettings {
    CompareSettings {
        mode,
        throttle,
        threshold,
    }
}

#[test]
fn test_rank_by_absolute_difference() {
    let a = run(&[("main", 5000.0), ("solve", 2000.0), ("io", 1500.0)]);
    let b = run(&[("main", 5100.0), ("solve", 4000.0), ("io", 1000.0)]);

    let report = compare_runs(
        (&a, "a"),
        (&b, "b"),
        "TIME",
        &settings(CompareMode::Absolute, 1000.0, 10),
    );

    let order: Vec<&str> = report.entries.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(order, vec!["solve", "io", "main"]);
    assert_eq!(report.entries[0].difference, 2000.0);
    assert_eq!(report.summary.events_compared, 3);
    assert_eq!(report.summary.events_throttled, 0);
}

#[test]
fn test_relative_mode_and_threshold() {
    let a = run(&[("main", 5000.0), ("solve", 2000.0), ("io", 1500.0)]);
    let b = run(&[("main", 5100.0), ("solve", 4000.0), ("io", 1000.0)]);

    let report = compare_runs(
        (&a, "a"),
        (&b, "b"),
        "TIME",
        &settings(CompareMode::Relative, 1000.0, 2),
    );

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.entries[0].event, "solve");
    assert_eq!(report.entries[0].difference, 1.0);
    assert_eq!(report.entries[1].event, "io");
    assert_eq!(report.summary.events_reported, 2);
}

#[test]
fn test_throttle_and_new_events() {
    let a = run(&[("main", 5000.0), ("tiny", 10.0)]);
    let b = run(&[("main", 6000.0), ("tiny", 900.0), ("fresh", 3000.0)]);

    let report = compare_runs(
        (&a, "a"),
        (&b, "b"),
        "TIME",
        &settings(CompareMode::Absolute, 1000.0, 10),
    );

    // `tiny` is under the throttle in a, `fresh` reads 0 in a
    assert_eq!(report.summary.events_compared, 3);
    assert_eq!(report.summary.events_throttled, 2);
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].event, "main");

    let text = render_text(&report);
    assert!(text.contains("main"));
    assert!(!text.contains("fresh"));
}

#[test]
fn test_report_json_roundtrip() {
    let a = run(&[("main", 5000.0)]);
    let b = run(&[("main", 7000.0)]);
    let report = compare_runs((&a, "a"), (&b, "b"), "TIME", &CompareSettings::default());

    let dir = tempdir().unwrap();
    let path = dir.path().join("compare.json");
    write_report(&vec![report], &path).unwrap();

    let back: Vec<CompareReport> = read_report(&path).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].metric, "TIME");
    assert_eq!(back[0].baseline.label, "a");
    assert_eq!(back[0].entries[0].target, 7000.0);
}
