use autoperf_ppk::commands::derive::DERIVED_METADATA_KEY;
use autoperf_ppk::commands::{
    execute_compare, execute_derive, execute_eval, execute_inspect, execute_stats, CompareArgs,
    DeriveArgs, EvalArgs, InspectArgs, StatsArgs,
};
use autoperf_ppk::output::{read_report, DocumentSummary, StatsReport};
use autoperf_ppk::parser::{Event, Hotspots};
use autoperf_ppk::store::{Document, Flavor, FunctionProfile, Profile, ThreadKey};
use autoperf_ppk::utils::config::CompareSettings;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_run(dir: &Path, name: &str, scale: f64) -> PathBuf {
    let hot = Hotspots::none();
    let mut doc = Document::default();
    doc.add_metric("TIME");
    doc.add_metric("PAPI_TOT_CYC");
    doc.add_metric("PAPI_TOT_INS");
    doc.add_event(Event::parse("main", &hot).unwrap());
    doc.add_event(Event::parse("main => solve", &hot).unwrap());

    for thread in 0..2 {
        for (event_id, time) in [(0, 2000.0), (1, 8000.0)] {
            let mut profile = Profile::new(1.0, 0.0);
            profile.set("TIME", time * scale, time * scale);
            profile.set("PAPI_TOT_CYC", 1000.0, 1000.0);
            profile.set("PAPI_TOT_INS", 3000.0, 3000.0);
            doc.add_function_profile(ThreadKey::new(0, 0, thread), FunctionProfile { event_id, profile })
                .unwrap();
        }
    }

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

#[test]
fn test_derive_then_stats() {
    let dir = tempdir().unwrap();
    let input = write_run(dir.path(), "run.ppk", 1.0);
    let output = dir.path().join("run.ipc.ppk");

    execute_derive(DeriveArgs {
        input,
        output: output.clone(),
        hotspots: vec![],
        metrics: vec!["IPC".to_string()],
        spec_dirs: vec![],
        collect_sysinfo: false,
        meta: vec![],
    })
    .unwrap();

    let doc = Document::load(&output, &Hotspots::none()).unwrap();
    assert!(doc.metrics().contains(&"IPC".to_string()));
    assert_eq!(
        doc.metadata().get(DERIVED_METADATA_KEY).map(String::as_str),
        Some("IPC")
    );

    let json = dir.path().join("stats.json");
    execute_stats(StatsArgs {
        input: output,
        hotspots: vec![],
        metric: "IPC".to_string(),
        flavor: Flavor::Exclusive,
        top: Some(1),
        derive: vec![],
        spec_dirs: vec![],
        collect_sysinfo: false,
        meta: vec![],
        output_json: Some(json.clone()),
    })
    .unwrap();

    let report: StatsReport = read_report(&json).unwrap();
    assert_eq!(report.thread_shape, [1, 1, 2]);
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].mean, 3.0);
}

#[test]
fn test_stats_derives_with_meta_overrides() {
    let dir = tempdir().unwrap();
    let input = write_run(dir.path(), "run.ppk", 1.0);
    let json = dir.path().join("stats.json");

    execute_stats(StatsArgs {
        input,
        hotspots: vec![],
        metric: "INS_PER_CORE".to_string(),
        flavor: Flavor::Exclusive,
        top: None,
        derive: vec!["INS_PER_CORE".to_string()],
        spec_dirs: vec![],
        collect_sysinfo: false,
        meta: vec![("META_CORE_NUM".to_string(), "4".to_string())],
        output_json: Some(json.clone()),
    })
    .unwrap();

    let report: StatsReport = read_report(&json).unwrap();
    assert_eq!(report.events.len(), 2);
    assert!(report.events.iter().all(|e| e.mean == 750.0));
}

#[test]
fn test_derive_requires_metrics() {
    let dir = tempdir().unwrap();
    let input = write_run(dir.path(), "run.ppk", 1.0);
    let result = execute_derive(DeriveArgs {
        input,
        output: dir.path().join("out.ppk"),
        hotspots: vec![],
        metrics: vec![],
        spec_dirs: vec![],
        collect_sysinfo: false,
        meta: vec![],
    });
    assert!(result.is_err());
}

#[test]
fn test_inspect_writes_summary() {
    let dir = tempdir().unwrap();
    let input = write_run(dir.path(), "run.ppk", 1.0);
    let json = dir.path().join("summary.json");

    execute_inspect(InspectArgs {
        input,
        hotspots: vec![],
        show_events: true,
        output_json: Some(json.clone()),
    })
    .unwrap();

    let summary: DocumentSummary = read_report(&json).unwrap();
    assert_eq!(summary.event_count, 2);
    assert_eq!(summary.aggregate_events, vec!["main".to_string(), "solve".to_string()]);
    assert_eq!(summary.threads, vec!["0,0,0".to_string(), "0,0,1".to_string()]);
}

#[test]
fn test_compare_with_derived_metric() {
    let dir = tempdir().unwrap();
    let a = write_run(dir.path(), "a.ppk", 1.0);
    let b = write_run(dir.path(), "b.ppk", 2.0);

    let reports = execute_compare(CompareArgs {
        baseline: a,
        target: b,
        hotspots: vec![],
        metrics: vec!["TIME".to_string(), "IPC".to_string()],
        spec_dirs: vec![],
        settings: CompareSettings::default(),
        collect_sysinfo: false,
        meta: vec![],
        output_json: None,
    })
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].entries[0].event, "solve");
    assert_eq!(reports[0].entries[0].difference, 8000.0);
    // IPC is 3 in both runs, far below the default throttle
    assert!(reports[1].entries.is_empty());
}

#[test]
fn test_eval_with_bindings() {
    let value = execute_eval(EvalArgs {
        expression: "IPC = INS / CYC".to_string(),
        bindings: vec![
            ("INS".to_string(), "300".to_string()),
            ("CYC".to_string(), "100".to_string()),
        ],
        show_rpn: true,
    })
    .unwrap();
    assert_eq!(value, 3.0);

    let bad = execute_eval(EvalArgs {
        expression: "A + 1".to_string(),
        bindings: vec![("A".to_string(), "one".to_string())],
        show_rpn: false,
    });
    assert!(bad.is_err());
}
