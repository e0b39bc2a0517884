//! Sysinfo command implementation.

use crate::metrics::SystemMetadata;
use crate::output::report_to_string;
use anyhow::Result;
use std::collections::BTreeMap;

/// Print the host's `META_*` values
///
/// **Public** - main entry point called from main.rs
pub fn execute_sysinfo(json: bool) -> Result<SystemMetadata> {
    let meta = SystemMetadata::collect();

    if json {
        let map: BTreeMap<&str, &str> = meta.iter().collect();
        println!("{}", report_to_string(&map)?);
    } else {
        for (name, value) in meta.iter() {
            println!("{:20}: {}", name, value);
        }
    }

    Ok(meta)
}
