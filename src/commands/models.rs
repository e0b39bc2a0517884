use crate::store::Flavor;
use crate::utils::config::CompareSettings;
use std::path::PathBuf;

/// Arguments for the inspect command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct InspectArgs {
    /// Packed profile to read
    pub input: PathBuf,

    /// Source-file patterns that steer short names
    pub hotspots: Vec<String>,

    /// Print every event's call path
    pub show_events: bool,

    /// Write a JSON summary here (optional)
    pub output_json: Option<PathBuf>,
}

/// Arguments for the stats command
#[derive(Debug, Clone)]
pub struct StatsArgs {
    pub input: PathBuf,

    pub hotspots: Vec<String>,

    /// Metric to report on
    pub metric: String,

    pub flavor: Flavor,

    /// Keep only the largest events by sum
    pub top: Option<usize>,

    /// Derived metric labels to attach before aggregating
    pub derive: Vec<String>,

    /// Directories searched for metric specifications
    pub spec_dirs: Vec<PathBuf>,

    /// Collect host `META_*` values when deriving
    pub collect_sysinfo: bool,

    /// `META_*` overrides
    pub meta: Vec<(String, String)>,

    pub output_json: Option<PathBuf>,
}

/// Arguments for the derive command
#[derive(Debug, Clone)]
pub struct DeriveArgs {
    pub input: PathBuf,

    /// Packed profile to write with the derived metrics added
    pub output: PathBuf,

    pub hotspots: Vec<String>,

    /// Metric labels, `NAME[@interval]`
    pub metrics: Vec<String>,

    pub spec_dirs: Vec<PathBuf>,

    /// Collect host `META_*` values
    pub collect_sysinfo: bool,

    /// `META_*` overrides
    pub meta: Vec<(String, String)>,
}

/// Arguments for the compare command
#[derive(Debug, Clone)]
pub struct CompareArgs {
    /// Run A
    pub baseline: PathBuf,

    /// Run B
    pub target: PathBuf,

    pub hotspots: Vec<String>,

    /// Metric labels to compare on; derived ones are attached first
    pub metrics: Vec<String>,

    pub spec_dirs: Vec<PathBuf>,

    pub settings: CompareSettings,

    pub collect_sysinfo: bool,

    pub meta: Vec<(String, String)>,

    pub output_json: Option<PathBuf>,
}

/// Arguments for the eval command
#[derive(Debug, Clone)]
pub struct EvalArgs {
    /// Infix expression
    pub expression: String,

    /// Variable bindings
    pub bindings: Vec<(String, String)>,

    /// Print the RPN form
    pub show_rpn: bool,
}
