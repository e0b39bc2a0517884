//! Output JSON schema definitions for document summaries.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::aggregator::Statistic;
use crate::store::{Document, Flavor};
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-thread statistics of one metric, written by `stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Profile the statistics came from
    pub source: String,

    pub metric: String,

    pub flavor: Flavor,

    /// `[nodes, contexts, threads]` of the dense array
    pub thread_shape: [usize; 3],

    /// Events ranked by sum (largest first)
    pub events: Vec<EventStats>,
}

/// Statistics of one event across all threads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventStats {
    /// Event short name
    pub event: String,

    pub sum: f64,

    pub max: f64,

    pub min: f64,

    /// Population standard deviation
    pub stddev: f64,

    pub mean: f64,

    /// Share of the metric's total sum over all events
    pub percentage: f64,
}

/// Structure of a decoded document, written by `inspect`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub schema_version: String,

    pub generated_at: String,

    pub source: String,

    pub version: i32,

    pub compatibility: i32,

    pub metadata: BTreeMap<String, String>,

    pub metrics: Vec<String>,

    pub groups: Vec<String>,

    /// Total entries in the event table
    pub event_count: usize,

    /// Entries marked derived
    pub derived_event_count: usize,

    /// Aggregated short names, first-seen order
    pub aggregate_events: Vec<String>,

    pub user_events: Vec<String>,

    /// `node,context,thread` of every thread
    pub threads: Vec<String>,
}

impl StatsReport {
    /// Collect statistics of `metric` for every aggregated event
    ///
    /// `limit` keeps only the largest events by sum.
    pub fn from_document(
        doc: &Document,
        source: &str,
        metric: &str,
        flavor: Flavor,
        limit: Option<usize>,
    ) -> Self {
        let view = doc.view();
        let total: f64 = doc
            .aggregate_events()
            .iter()
            .map(|e| view.get(e, metric, Statistic::Sum, flavor))
            .sum();

        let limit = limit.unwrap_or(usize::MAX);
        let events: Vec<EventStats> = view
            .top_events(metric, Statistic::Sum, flavor, limit)
            .into_iter()
            .map(|(event, sum)| {
                let stat = |s| view.get(&event, metric, s, flavor);
                EventStats {
                    max: stat(Statistic::Max),
                    min: stat(Statistic::Min),
                    stddev: stat(Statistic::StdDev),
                    mean: stat(Statistic::Mean),
                    percentage: if total > 0.0 { sum / total * 100.0 } else { 0.0 },
                    sum,
                    event,
                }
            })
            .collect();

        let [n, c, t, _, _] = view.shape();
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            source: source.to_string(),
            metric: metric.to_string(),
            flavor,
            thread_shape: [n, c, t],
            events,
        }
    }
}

impl DocumentSummary {
    pub fn from_document(doc: &Document, source: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            source: source.to_string(),
            version: doc.version(),
            compatibility: doc.compatibility(),
            metadata: doc.metadata().clone(),
            metrics: doc.metrics().to_vec(),
            groups: doc.groups().to_vec(),
            event_count: doc.events().len(),
            derived_event_count: doc.events().iter().filter(|e| e.is_derived).count(),
            aggregate_events: doc.aggregate_events().to_vec(),
            user_events: doc.user_events().to_vec(),
            threads: doc.threads().iter().map(|t| t.key().to_string()).collect(),
        }
    }
}
