//! System metadata made available to derived metric expressions.
//!
//! Keys carry the `META_` prefix. Sizes are in kB. Only numeric values
//! enter a symbol table; the CPU model is kept for display.

use crate::mathexp::SymbolTable;
use crate::utils::config::META_PREFIX;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

const CPUINFO: &str = "/proc/cpuinfo";
const MEMINFO: &str = "/proc/meminfo";
const CPU0_CACHE: &str = "/sys/devices/system/cpu/cpu0/cache";

/// Flat `META_*` name to value map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemMetadata {
    values: BTreeMap<String, String>,
}

impl SystemMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the running Linux host
    ///
    /// Each source is optional; an unreadable one is logged and skipped.
    pub fn collect() -> Self {
        let mut meta = Self::new();

        match fs::read_to_string(CPUINFO) {
            Ok(text) => meta.extend(parse_cpuinfo(&text)),
            Err(e) => warn!("Cannot read {}: {}", CPUINFO, e),
        }

        let cache_dir = Path::new(CPU0_CACHE);
        if cache_dir.is_dir() {
            meta.extend(read_cache_dir(cache_dir));
        } else {
            debug!("No cache topology at {}", CPU0_CACHE);
        }

        match fs::read_to_string(MEMINFO) {
            Ok(text) => meta.extend(parse_meminfo(&text)),
            Err(e) => warn!("Cannot read {}: {}", MEMINFO, e),
        }

        debug!("Collected {} system metadata entries", meta.len());
        meta
    }

    /// Build from explicit pairs; names lacking `META_` get the prefix
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: ToString,
    {
        let mut meta = Self::new();
        for (k, v) in pairs {
            meta.insert(k.as_ref(), v);
        }
        meta
    }

    pub fn insert(&mut self, name: &str, value: impl ToString) {
        let key = if name.starts_with(META_PREFIX) {
            name.to_string()
        } else {
            format!("{}{}", META_PREFIX, name)
        };
        self.values.insert(key, value.to_string());
    }

    fn extend(&mut self, entries: Vec<(String, String)>) {
        for (k, v) in entries {
            self.insert(&k, v);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric entries as expression symbols
    pub fn symbols(&self) -> SymbolTable {
        self.values
            .iter()
            .filter_map(|(k, v)| v.trim().parse::<f64>().ok().map(|n| (k.clone(), n)))
            .collect()
    }
}

/// `META_CORE_NUM`, `META_CPU_NUM` and `META_CPU_MODEL` from `/proc/cpuinfo`
pub fn parse_cpuinfo(text: &str) -> Vec<(String, String)> {
    let blocks: Vec<&str> = text
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .collect();

    let mut model = None;
    let mut packages = BTreeSet::new();
    for block in &blocks {
        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "model name" if model.is_none() => model = Some(value.trim().to_string()),
                "physical id" => {
                    packages.insert(value.trim().to_string());
                }
                _ => {}
            }
        }
    }

    let mut entries = vec![("META_CORE_NUM".to_string(), blocks.len().to_string())];
    if !blocks.is_empty() {
        // single-socket machines may omit `physical id`
        let sockets = packages.len().max(1);
        entries.push(("META_CPU_NUM".to_string(), sockets.to_string()));
    }
    if let Some(model) = model {
        entries.push(("META_CPU_MODEL".to_string(), model));
    }
    entries
}

/// `META_MEM_SIZE` (kB) from `/proc/meminfo`
pub fn parse_meminfo(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| line.strip_prefix("MemTotal:"))
        .filter_map(|rest| rest.trim().strip_suffix("kB"))
        .filter_map(|kb| kb.trim().parse::<u64>().ok())
        .take(1)
        .map(|kb| ("META_MEM_SIZE".to_string(), kb.to_string()))
        .collect()
}

/// Parse a sysfs cache size such as `32K` or `8M` into kB
pub fn parse_cache_size(size: &str) -> Option<u64> {
    let size = size.trim();
    if let Some(k) = size.strip_suffix('K') {
        k.parse().ok()
    } else if let Some(m) = size.strip_suffix('M') {
        m.parse::<u64>().ok().map(|m| m * 1024)
    } else {
        size.parse().ok()
    }
}

/// Cache sizes from a sysfs `cache` directory of `index*` entries
///
/// Data and instruction caches give `META_L<n>_DSIZE` / `META_L<n>_ISIZE`;
/// `META_L<n>_SIZE` totals every cache at that level.
pub fn read_cache_dir(dir: &Path) -> Vec<(String, String)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut sizes: BTreeMap<String, u64> = BTreeMap::new();
    for entry in entries.flatten() {
        let index = entry.path();
        let read = |name: &str| fs::read_to_string(index.join(name)).ok();
        let (Some(level), Some(kind), Some(size)) = (read("level"), read("type"), read("size"))
        else {
            continue;
        };
        let Some(size) = parse_cache_size(&size) else {
            continue;
        };

        let level = level.trim();
        match kind.trim() {
            "Data" => *sizes.entry(format!("L{}_D", level)).or_default() += size,
            "Instruction" => *sizes.entry(format!("L{}_I", level)).or_default() += size,
            _ => {}
        }
        *sizes.entry(format!("L{}_", level)).or_default() += size;
    }

    sizes
        .into_iter()
        .map(|(key, size)| (format!("{}{}SIZE", META_PREFIX, key), size.to_string()))
        .collect()
}
