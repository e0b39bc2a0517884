//! Label parsing for packed profile events.
//!
//! This module handles:
//! - Classifying single profiler-emitted labels (`function_name`)
//! - Splitting call paths and choosing aggregation short names (`event`)

pub mod event;
pub mod function_name;

// Re-export main types
pub use event::{Event, Hotspots};
pub use function_name::{parse_function_name, FunctionKind, FunctionName, SourceLocation};
