//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod compare;
pub mod derive;
pub mod eval;
pub mod inspect;
pub mod models;
pub mod stats;
pub mod sysinfo;
pub mod utils;

// Re-export main command functions
pub use compare::execute_compare;
pub use derive::execute_derive;
pub use eval::execute_eval;
pub use inspect::execute_inspect;
pub use models::{CompareArgs, DeriveArgs, EvalArgs, InspectArgs, StatsArgs};
pub use stats::execute_stats;
pub use sysinfo::execute_sysinfo;
