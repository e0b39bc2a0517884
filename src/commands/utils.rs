//! Helpers shared by the command implementations.

use crate::metrics::{MetricSet, SpecLibrary, SystemMetadata};
use crate::parser::{Event, Hotspots};
use crate::store::Document;
use crate::utils::indent::{indent, note};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Compile hotspot patterns, naming the offending one on failure
pub fn build_hotspots(patterns: &[String]) -> Result<Hotspots> {
    Hotspots::new(patterns).context("Invalid hotspot pattern")
}

/// Load a packed profile with error context
pub fn load_document(path: &Path, hotspots: &Hotspots) -> Result<Document> {
    Document::load(path, hotspots)
        .with_context(|| format!("Failed to load packed profile {}", path.display()))
}

/// Resolve metric labels against the spec directories
pub fn build_metric_set(labels: &[String], spec_dirs: &[PathBuf]) -> Result<MetricSet> {
    MetricSet::from_labels(SpecLibrary::new(spec_dirs.to_vec()), labels)
        .context("Failed to resolve metric set")
}

/// Host metadata overlaid with `KEY=VALUE` overrides
pub fn system_metadata(collect: bool, overrides: &[(String, String)]) -> SystemMetadata {
    let mut meta = if collect {
        SystemMetadata::collect()
    } else {
        SystemMetadata::new()
    };
    for (name, value) in overrides {
        meta.insert(name, value);
    }
    meta
}

/// Split `KEY=VALUE`
pub fn parse_key_value(pair: &str) -> Result<(String, String), String> {
    match pair.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", pair)),
    }
}

/// Metric names of labels, without their `@interval`
pub fn metric_names(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|l| l.split_once('@').map_or(l.as_str(), |(name, _)| name).trim().to_string())
        .collect()
}

/// Call path of an event, one frame per line, nested by depth
pub fn render_call_path(event: &Event, depth: usize) -> String {
    let mut out = String::new();
    for (i, frame) in event.call_path.iter().enumerate() {
        out.push_str(&format!(
            "{}[{}] {}\n",
            indent(depth + i),
            frame.kind,
            frame.signature
        ));
        if let Some(file) = frame.source_file() {
            out.push_str(&note(
                depth + i + 1,
                &format!("{} {}", file, frame.line_range().unwrap_or("")),
            ));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("META_CORE_NUM=8").unwrap(),
            ("META_CORE_NUM".to_string(), "8".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=3").is_err());
    }

    #[test]
    fn test_metric_names_strip_interval() {
        let labels = vec!["PAPI_TOT_CYC@5000".to_string(), "IPC".to_string()];
        assert_eq!(metric_names(&labels), vec!["PAPI_TOT_CYC", "IPC"]);
    }

    #[test]
    fn test_render_call_path_nests_frames() {
        let event = Event::parse("main => [SAMPLE] compute [{hot.c} 12]", &Hotspots::none()).unwrap();
        let text = render_call_path(&event, 1);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "    [INSTRU] main");
        assert_eq!(lines[1], "        [SAMPLE] compute");
        assert_eq!(lines[2], "            # hot.c 12");
    }
}
