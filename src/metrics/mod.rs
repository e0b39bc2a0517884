//! Derived metrics: specification lookup, dependency resolution and
//! the system metadata they may reference.

pub mod metric_set;
pub mod spec;
pub mod sysinfo;

pub use metric_set::{is_derived, MetricSet};
pub use spec::SpecLibrary;
pub use sysinfo::SystemMetadata;
