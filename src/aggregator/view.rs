//! Cross-thread statistics of a document's per-thread aggregates.
//!
//! Memory use is `nodes x contexts x threads x events x metrics` doubles
//! per flavor, where `contexts` is the largest context count of any node
//! and `threads` the largest thread count of any context. This dominates
//! the cost of holding a document.

use super::array::{DenseArray, Reduction, Statistic, RANK};
use crate::store::{Document, Flavor, ThreadKey};
use log::debug;
use std::collections::HashMap;

/// Dense aggregate arrays and their reductions for both flavors
#[derive(Debug, Clone, Default)]
pub struct AggregateView {
    events: Vec<String>,
    metrics: Vec<String>,
    event_index: HashMap<String, usize>,
    metric_index: HashMap<String, usize>,
    exclusive: DenseArray,
    inclusive: DenseArray,
    exclusive_stats: Reduction,
    inclusive_stats: Reduction,
}

impl AggregateView {
    /// Populate the dense arrays from every thread's short-name aggregates
    ///
    /// **Public** - called by the document after decode and after derived
    /// metrics are attached
    ///
    /// Nodes, contexts within a node, and threads within a context take
    /// dense positions in first-seen order.
    pub fn build(doc: &Document) -> Self {
        let positions = thread_positions(doc.threads().iter().map(|t| t.key()));
        let dims = positions.values().fold([0usize; 3], |mut dims, pos| {
            for axis in 0..3 {
                dims[axis] = dims[axis].max(pos[axis] + 1);
            }
            dims
        });

        let events = doc.aggregate_events().to_vec();
        let metrics = doc.metrics().to_vec();
        let shape: [usize; RANK] = [dims[0], dims[1], dims[2], events.len(), metrics.len()];

        let mut exclusive = DenseArray::zeros(shape);
        let mut inclusive = DenseArray::zeros(shape);

        for thread in doc.threads() {
            let Some(&[n, c, t]) = positions.get(&thread.key()) else {
                continue;
            };
            for (e, event) in events.iter().enumerate() {
                let Some(profile) = thread.aggregate(event) else {
                    continue;
                };
                for (m, metric) in metrics.iter().enumerate() {
                    if let Some(v) = profile.value(metric, Flavor::Exclusive) {
                        exclusive.set([n, c, t, e, m], v);
                    }
                    if let Some(v) = profile.value(metric, Flavor::Inclusive) {
                        inclusive.set([n, c, t, e, m], v);
                    }
                }
            }
        }

        debug!(
            "Aggregate array shape {:?} ({} cells per flavor)",
            shape,
            exclusive.len()
        );

        let exclusive_stats = exclusive.reduce_threads();
        let inclusive_stats = inclusive.reduce_threads();

        Self {
            event_index: index_of(&events),
            metric_index: index_of(&metrics),
            events,
            metrics,
            exclusive,
            inclusive,
            exclusive_stats,
            inclusive_stats,
        }
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// `[nodes, contexts, threads, events, metrics]`
    pub fn shape(&self) -> [usize; RANK] {
        self.exclusive.shape()
    }

    /// Statistic of one event and metric across all threads
    ///
    /// Returns 0 when the event or metric is not part of the view, so
    /// runs with different event sets can be compared directly.
    pub fn get(&self, event: &str, metric: &str, stat: Statistic, flavor: Flavor) -> f64 {
        let (Some(&e), Some(&m)) = (self.event_index.get(event), self.metric_index.get(metric))
        else {
            return 0.0;
        };
        let stats = match flavor {
            Flavor::Exclusive => &self.exclusive_stats,
            Flavor::Inclusive => &self.inclusive_stats,
        };
        stats.get(e, m, stat).unwrap_or(0.0)
    }

    /// Events ranked by a statistic, largest first
    pub fn top_events(
        &self,
        metric: &str,
        stat: Statistic,
        flavor: Flavor,
        limit: usize,
    ) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .events
            .iter()
            .map(|e| (e.clone(), self.get(e, metric, stat, flavor)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }
}

fn index_of(names: &[String]) -> HashMap<String, usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

/// Dense (node, context, thread) positions in first-seen order
fn thread_positions(keys: impl Iterator<Item = ThreadKey>) -> HashMap<ThreadKey, [usize; 3]> {
    let mut nodes: Vec<i32> = Vec::new();
    let mut contexts: HashMap<i32, Vec<i32>> = HashMap::new();
    let mut threads: HashMap<(i32, i32), Vec<i32>> = HashMap::new();
    let mut positions = HashMap::new();

    for key in keys {
        let n = position_or_push(&mut nodes, key.node);
        let c = position_or_push(contexts.entry(key.node).or_default(), key.context);
        let t = position_or_push(
            threads.entry((key.node, key.context)).or_default(),
            key.thread,
        );
        positions.insert(key, [n, c, t]);
    }
    positions
}

fn position_or_push(list: &mut Vec<i32>, id: i32) -> usize {
    match list.iter().position(|&x| x == id) {
        Some(i) => i,
        None => {
            list.push(id);
            list.len() - 1
        }
    }
}
