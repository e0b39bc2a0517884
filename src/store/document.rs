//! In-memory packed profile document.
//!
//! A document is decoded whole or not at all. Threads are created lazily
//! the first time their (node, context, thread) triple appears and are
//! never removed. Genuine function profiles are folded into per-thread
//! aggregates keyed by event short name as they are added.

use super::decode::decode_document;
use super::encode::encode_document;
use super::model::{Flavor, FunctionProfile, Thread, ThreadKey, UserEventProfile};
use crate::aggregator::{AggregateView, Statistic};
use crate::codec::{compress, decompress};
use crate::metrics::{MetricSet, SystemMetadata};
use crate::parser::{Event, Hotspots};
use crate::utils::config::{MAX_COMPATIBILITY, METADATA_VERSION};
use crate::utils::error::{CodecError, DocumentError};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// A decoded packed profile
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) version: i32,
    pub(crate) compatibility: i32,
    /// Header word kept verbatim for re-encoding
    pub(crate) pad: i32,
    /// Length of the opaque block older readers skip
    pub(crate) skip_len: usize,
    metadata: BTreeMap<String, String>,
    metrics: Vec<String>,
    groups: Vec<String>,
    events: Vec<Event>,
    user_events: Vec<String>,
    threads: Vec<Thread>,
    thread_index: HashMap<ThreadKey, usize>,
    /// Short names of genuine events, first-seen order
    agg_events: Vec<String>,
    view: AggregateView,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(METADATA_VERSION, MAX_COMPATIBILITY)
    }
}

impl Document {
    /// Empty document with the given header
    pub fn new(version: i32, compatibility: i32) -> Self {
        Self {
            version,
            compatibility,
            pad: 0,
            skip_len: 0,
            metadata: BTreeMap::new(),
            metrics: Vec::new(),
            groups: Vec::new(),
            events: Vec::new(),
            user_events: Vec::new(),
            threads: Vec::new(),
            thread_index: HashMap::new(),
            agg_events: Vec::new(),
            view: AggregateView::default(),
        }
    }

    /// Read and decode a gzip-wrapped packed profile
    ///
    /// **Public** - main entry point for loading profiles
    ///
    /// # Arguments
    /// * `path` - packed profile file
    /// * `hotspots` - source-file patterns that steer short names
    ///
    /// # Errors
    /// * `DocumentError::Codec` - unreadable file or malformed payload
    /// * `DocumentError::Parse` - an event name cannot be classified
    ///
    /// # Example
    /// ```ignore
    /// let doc = Document::load("profile.ppk", &Hotspots::none())?;
    /// let mean = doc.aggregate("main", "TIME", Statistic::Mean, Flavor::Exclusive);
    /// ```
    pub fn load(path: impl AsRef<Path>, hotspots: &Hotspots) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        info!("Loading packed profile {}", path.display());
        let compressed = fs::read(path).map_err(CodecError::from)?;
        Self::from_gzip(&compressed, hotspots)
    }

    /// Decode from gzip-wrapped bytes
    pub fn from_gzip(compressed: &[u8], hotspots: &Hotspots) -> Result<Self, DocumentError> {
        let raw = decompress(compressed)?;
        decode_document(&raw, hotspots)
    }

    /// Encode and write as a gzip-wrapped packed profile
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let bytes = self.to_gzip()?;
        fs::write(path, &bytes).map_err(CodecError::from)?;
        info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    pub fn to_gzip(&self) -> Result<Vec<u8>, CodecError> {
        compress(&encode_document(self)?)
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn compatibility(&self) -> i32 {
        self.compatibility
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Add or replace a trial-level metadata entry
    pub fn insert_metadata(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(name.into(), value.into());
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn user_events(&self) -> &[String] {
        &self.user_events
    }

    /// Threads in first-seen order
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn thread(&self, key: ThreadKey) -> Option<&Thread> {
        self.thread_index.get(&key).map(|&i| &self.threads[i])
    }

    /// Short names of aggregated events, first-seen order
    pub fn aggregate_events(&self) -> &[String] {
        &self.agg_events
    }

    pub fn view(&self) -> &AggregateView {
        &self.view
    }

    /// Append a metric name; returns its index
    pub fn add_metric(&mut self, name: impl Into<String>) -> usize {
        push_unique(&mut self.metrics, name.into())
    }

    /// Append a group name; returns its index
    pub fn add_group(&mut self, name: impl Into<String>) -> usize {
        push_unique(&mut self.groups, name.into())
    }

    /// Append an event; its groups are registered as needed
    pub fn add_event(&mut self, event: Event) -> usize {
        for group in &event.groups {
            self.add_group(group.clone());
        }
        self.events.push(event);
        self.events.len() - 1
    }

    pub fn add_user_event(&mut self, name: impl Into<String>) -> usize {
        self.user_events.push(name.into());
        self.user_events.len() - 1
    }

    /// The thread for `key`, created on first use
    pub fn thread_mut(&mut self, key: ThreadKey) -> &mut Thread {
        let index = match self.thread_index.get(&key) {
            Some(&i) => i,
            None => {
                debug!("New thread {}", key);
                self.threads.push(Thread::new(key));
                self.thread_index.insert(key, self.threads.len() - 1);
                self.threads.len() - 1
            }
        };
        &mut self.threads[index]
    }

    /// Store a raw profile and fold it into the thread's aggregates
    ///
    /// # Errors
    /// * `CodecError::MalformedDocument` - unknown event id, or the event
    ///   already has a profile on this thread
    pub fn add_function_profile(
        &mut self,
        key: ThreadKey,
        profile: FunctionProfile,
    ) -> Result<(), CodecError> {
        let event = self.events.get(profile.event_id).ok_or_else(|| {
            CodecError::MalformedDocument(format!(
                "function id {} out of range ({} events)",
                profile.event_id,
                self.events.len()
            ))
        })?;
        let short_name = match (&event.short_name, event.is_derived) {
            (Some(name), false) => Some(name.clone()),
            _ => None,
        };

        let thread = self.thread_mut(key);
        if let Some(name) = &short_name {
            if thread.function_profile(profile.event_id).is_none() {
                thread.accumulate(name, &profile.profile);
            }
        }
        let event_id = profile.event_id;
        if !thread.push_function_profile(profile) {
            return Err(CodecError::MalformedDocument(format!(
                "function id {} appears twice on thread {}",
                event_id, key
            )));
        }

        if let Some(name) = short_name {
            if !self.agg_events.contains(&name) {
                self.agg_events.push(name);
            }
        }
        Ok(())
    }

    /// Store a user event profile
    ///
    /// # Errors
    /// * `CodecError::MalformedDocument` - unknown user event id, or the
    ///   user event already has a profile on this thread
    pub fn add_user_event_profile(
        &mut self,
        key: ThreadKey,
        profile: UserEventProfile,
    ) -> Result<(), CodecError> {
        if profile.user_event_id >= self.user_events.len() {
            return Err(CodecError::MalformedDocument(format!(
                "user event id {} out of range ({} user events)",
                profile.user_event_id,
                self.user_events.len()
            )));
        }
        let user_event_id = profile.user_event_id;
        if !self.thread_mut(key).push_user_event_profile(profile) {
            return Err(CodecError::MalformedDocument(format!(
                "user event id {} appears twice on thread {}",
                user_event_id, key
            )));
        }
        Ok(())
    }

    /// Rebuild the dense aggregate view from the per-thread aggregates
    pub fn populate_aggregates(&mut self) {
        self.view = AggregateView::build(self);
    }

    /// Aggregate statistic across all threads; 0 if the event or metric
    /// is absent
    pub fn aggregate(&self, event: &str, metric: &str, stat: Statistic, flavor: Flavor) -> f64 {
        self.view.get(event, metric, stat, flavor)
    }

    /// Raw reading of one event on one thread
    ///
    /// Unlike [`Document::aggregate`] this fails on anything missing.
    ///
    /// # Arguments
    /// * `thread` - position in [`Document::threads`]
    /// * `event` - full event name
    ///
    /// # Errors
    /// * `DocumentError::NoSuchThread`
    /// * `DocumentError::NoSuchEvent` - unknown name or no profile on that thread
    /// * `DocumentError::NoSuchMetric`
    pub fn data_point(
        &self,
        thread: usize,
        event: &str,
        metric: &str,
        flavor: Flavor,
    ) -> Result<f64, DocumentError> {
        let t = self
            .threads
            .get(thread)
            .ok_or(DocumentError::NoSuchThread(thread))?;
        let event_id = self
            .events
            .iter()
            .position(|e| e.full_name == event)
            .ok_or_else(|| DocumentError::NoSuchEvent(event.to_string()))?;
        let profile = t
            .function_profile(event_id)
            .ok_or_else(|| DocumentError::NoSuchEvent(event.to_string()))?;
        profile
            .profile
            .value(metric, flavor)
            .ok_or_else(|| DocumentError::NoSuchMetric(metric.to_string()))
    }

    /// Compute derived metrics for every raw and aggregated profile
    ///
    /// **Public** - appends `set.derived_metrics()` to the metric list and
    /// re-aggregates
    ///
    /// # Errors
    /// * `DocumentError::MetricSetTooWide` - a native metric the set needs
    ///   is not recorded in this document
    /// * `DocumentError::Expression` - evaluation failed for some profile;
    ///   the document is left as it was
    pub fn attach_metric_set(
        &mut self,
        set: &MetricSet,
        meta: &SystemMetadata,
    ) -> Result<(), DocumentError> {
        let missing: Vec<String> = set
            .native_metrics()
            .iter()
            .filter(|m| !self.metrics.contains(m))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DocumentError::MetricSetTooWide(missing));
        }

        // evaluate on copies so a failure leaves the document untouched
        let symbols = meta.symbols();
        let mut threads = self.threads.clone();
        let mut updated = 0usize;
        for thread in &mut threads {
            for profile in thread.profiles_mut() {
                profile.update_derived(set, &symbols)?;
                updated += 1;
            }
        }

        self.threads = threads;
        for metric in set.derived_metrics() {
            if !self.metrics.contains(metric) {
                self.metrics.push(metric.clone());
            }
        }
        info!(
            "Attached {} derived metrics to {} profiles",
            set.derived_metrics().len(),
            updated
        );

        self.populate_aggregates();
        Ok(())
    }
}

fn push_unique(list: &mut Vec<String>, name: String) -> usize {
    match list.iter().position(|n| *n == name) {
        Some(i) => i,
        None => {
            list.push(name);
            list.len() - 1
        }
    }
}
