//! Call-path events and their canonical short names.
//!
//! An event name is a `=>`-separated call path, e.g.
//!
//! ```text
//! .TAU application => [CONTEXT] .TAU application => [UNWIND] main => [SAMPLE] compute [{hot.c} 12]
//! ```
//!
//! Sampling and unwinding leave bookkeeping entries next to the genuine
//! samples; those are marked derived so aggregation never counts them twice.

use super::function_name::{parse_function_name, FunctionName};
use crate::utils::config::{CALLPATH_SEPARATOR, DERIVED_TAGS, ROOT_EVENT};
use crate::utils::error::ParseError;
use log::debug;
use regex::Regex;

/// Source-file patterns of interest
///
/// A frame whose file contains a match is preferred as the short name
/// over the innermost resolved frame.
#[derive(Debug, Clone, Default)]
pub struct Hotspots {
    patterns: Vec<Regex>,
}

impl Hotspots {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ParseError> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if any pattern occurs anywhere in `file`
    pub fn matches(&self, file: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(file))
    }
}

/// One entry of the document's event table
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub full_name: String,
    pub call_path: Vec<FunctionName>,
    /// Aggregation identity; `None` only for derived events
    pub short_name: Option<String>,
    pub is_derived: bool,
    pub groups: Vec<String>,
}

impl Event {
    /// Parse a full call-path name
    ///
    /// # Errors
    /// * `ParseError::InvalidFunctionName` - a frame cannot be classified
    /// * `ParseError::InvalidEvent` - a genuine event has no usable frame
    pub fn parse(full_name: &str, hotspots: &Hotspots) -> Result<Self, ParseError> {
        let call_path = full_name
            .split(CALLPATH_SEPARATOR)
            .map(|frame| parse_function_name(frame.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        let is_derived = classify_derived(full_name, call_path.len());
        let short_name = pick_short_name(&call_path, hotspots);

        if short_name.is_none() && !is_derived {
            return Err(ParseError::InvalidEvent(full_name.to_string()));
        }

        if short_name.is_none() {
            debug!("Derived event without short name: {}", full_name);
        }

        Ok(Self {
            full_name: full_name.to_string(),
            call_path,
            short_name,
            is_derived,
            groups: Vec::new(),
        })
    }

    pub fn add_group(&mut self, group: impl Into<String>) {
        self.groups.push(group.into());
    }

    /// Innermost frame of the call path
    pub fn leaf(&self) -> Option<&FunctionName> {
        self.call_path.last()
    }
}

/// Single frames are derived when they carry a bookkeeping tag or are the
/// root timer; multi-frame paths only when a sampling context lacks its
/// terminal sample.
fn classify_derived(full_name: &str, depth: usize) -> bool {
    if depth == 1 {
        DERIVED_TAGS.iter().any(|tag| full_name.contains(tag)) || full_name == ROOT_EVENT
    } else {
        full_name.contains("[CONTEXT]") && !full_name.contains("[SAMPLE]")
    }
}

/// Walk from the innermost frame outward; a hotspot frame beats the
/// first resolved frame.
fn pick_short_name(call_path: &[FunctionName], hotspots: &Hotspots) -> Option<String> {
    let mut first_resolved: Option<&FunctionName> = None;
    let mut first_hotspot: Option<&FunctionName> = None;

    for frame in call_path.iter().rev().filter(|f| f.resolved) {
        if first_resolved.is_none() {
            first_resolved = Some(frame);
        }
        if first_hotspot.is_none() && frame.source_file().map_or(false, |f| hotspots.matches(f)) {
            first_hotspot = Some(frame);
        }
        if first_hotspot.is_some() {
            break;
        }
    }

    first_hotspot
        .or(first_resolved)
        .map(|frame| frame.signature.clone())
}
