//! Autoperf PPK CLI
//!
//! Inspects packed profiles, reduces metrics across threads, attaches
//! derived metrics and compares two runs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use std::path::PathBuf;

use autoperf_ppk::commands::utils::parse_key_value;
use autoperf_ppk::commands::{
    execute_compare, execute_derive, execute_eval, execute_inspect, execute_stats,
    execute_sysinfo, CompareArgs, DeriveArgs, EvalArgs, InspectArgs, StatsArgs,
};
use autoperf_ppk::metrics::SpecLibrary;
use autoperf_ppk::store::Flavor;
use autoperf_ppk::utils::config::{load_config, AnalysisConfig, CompareMode, SCHEMA_VERSION};

/// Autoperf PPK - packed profile analysis
#[derive(Parser, Debug)]
#[command(name = "autoperf-ppk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Analysis configuration (TOML)
    #[arg(short, long, global = true, env = "AUTOPERF_CONFIG")]
    config: Option<PathBuf>,

    /// Source-file pattern steering short names (repeatable)
    #[arg(long = "hotspot", global = true)]
    hotspots: Vec<String>,

    /// Directory searched for metric specifications (repeatable)
    #[arg(long = "spec-dir", global = true)]
    spec_dirs: Vec<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the structure of a packed profile
    Inspect {
        /// Packed profile to read
        input: PathBuf,

        /// List every event with its call path
        #[arg(long)]
        events: bool,

        /// Write a JSON summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reduce one metric across all threads per event
    Stats {
        input: PathBuf,

        /// Metric to report on
        #[arg(short, long, default_value = "TIME")]
        metric: String,

        /// Use inclusive instead of exclusive values
        #[arg(long)]
        inclusive: bool,

        /// Keep only the N largest events
        #[arg(long)]
        top: Option<usize>,

        /// Derived metric label to attach first (repeatable)
        #[arg(long)]
        derive: Vec<String>,

        /// Skip collecting host META_* values
        #[arg(long)]
        no_sysinfo: bool,

        /// META_* override, KEY=VALUE (repeatable)
        #[arg(long, value_parser = parse_key_value)]
        meta: Vec<(String, String)>,

        /// Write statistics JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Attach derived metrics and write a new packed profile
    Derive {
        input: PathBuf,

        /// Packed profile to write
        #[arg(short, long)]
        output: PathBuf,

        /// Metric label, NAME[@interval] (repeatable)
        #[arg(short, long = "metric")]
        metrics: Vec<String>,

        /// Skip collecting host META_* values
        #[arg(long)]
        no_sysinfo: bool,

        /// META_* override, KEY=VALUE (repeatable)
        #[arg(long, value_parser = parse_key_value)]
        meta: Vec<(String, String)>,
    },

    /// Rank events whose mean moved most between two runs
    Compare {
        /// Run A
        baseline: PathBuf,

        /// Run B
        target: PathBuf,

        /// Metric label to compare on (repeatable)
        #[arg(short, long = "metric")]
        metrics: Vec<String>,

        /// Use |b - a| / a instead of |b - a|
        #[arg(long)]
        relative: bool,

        /// Drop events below this value in either run
        #[arg(long)]
        throttle: Option<f64>,

        /// Number of events to report
        #[arg(long)]
        threshold: Option<usize>,

        #[arg(long)]
        no_sysinfo: bool,

        #[arg(long, value_parser = parse_key_value)]
        meta: Vec<(String, String)>,

        /// Write comparison JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate an infix expression
    Eval {
        expression: String,

        /// Variable binding, NAME=VALUE (repeatable)
        #[arg(short = 'D', long = "define", value_parser = parse_key_value)]
        bindings: Vec<(String, String)>,

        /// Print the RPN form
        #[arg(long)]
        rpn: bool,
    },

    /// Print the host's META_* values
    Sysinfo {
        #[arg(long)]
        json: bool,
    },

    /// List bundled metric specifications
    Specs,

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    debug!("Configuration: {:?}", config);

    // CLI entries come first so they win lookups
    let hotspots: Vec<String> = cli
        .hotspots
        .iter()
        .chain(config.hotspots.iter())
        .cloned()
        .collect();
    let spec_dirs: Vec<PathBuf> = cli
        .spec_dirs
        .iter()
        .chain(config.spec_dirs.iter())
        .cloned()
        .collect();
    let or_config = |metrics: Vec<String>| {
        if metrics.is_empty() {
            config.metrics.clone()
        } else {
            metrics
        }
    };

    match cli.command {
        Commands::Inspect {
            input,
            events,
            output,
        } => execute_inspect(InspectArgs {
            input,
            hotspots,
            show_events: events,
            output_json: output,
        }),

        Commands::Stats {
            input,
            metric,
            inclusive,
            top,
            derive,
            no_sysinfo,
            meta,
            output,
        } => execute_stats(StatsArgs {
            input,
            hotspots,
            metric,
            flavor: if inclusive {
                Flavor::Inclusive
            } else {
                Flavor::Exclusive
            },
            top,
            derive,
            spec_dirs,
            collect_sysinfo: !no_sysinfo,
            meta,
            output_json: output,
        }),

        Commands::Derive {
            input,
            output,
            metrics,
            no_sysinfo,
            meta,
        } => execute_derive(DeriveArgs {
            input,
            output,
            hotspots,
            metrics: or_config(metrics),
            spec_dirs,
            collect_sysinfo: !no_sysinfo,
            meta,
        }),

        Commands::Compare {
            baseline,
            target,
            metrics,
            relative,
            throttle,
            threshold,
            no_sysinfo,
            meta,
            output,
        } => {
            let mut settings = config.compare.clone();
            if relative {
                settings.mode = CompareMode::Relative;
            }
            if let Some(throttle) = throttle {
                settings.throttle = throttle;
            }
            if let Some(threshold) = threshold {
                settings.threshold = threshold;
            }
            let metrics = or_config(metrics);
            execute_compare(CompareArgs {
                baseline,
                target,
                hotspots,
                metrics: if metrics.is_empty() {
                    vec!["TIME".to_string()]
                } else {
                    metrics
                },
                spec_dirs,
                settings,
                collect_sysinfo: !no_sysinfo,
                meta,
                output_json: output,
            })
            .map(|reports| info!("✓ Compared {} metric(s)", reports.len()))
        }

        Commands::Eval {
            expression,
            bindings,
            rpn,
        } => execute_eval(EvalArgs {
            expression,
            bindings,
            show_rpn: rpn,
        })
        .map(|_| ()),

        Commands::Sysinfo { json } => execute_sysinfo(json).map(|_| ()),

        Commands::Specs => {
            for name in SpecLibrary::bundled_names() {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Version => {
            println!("autoperf-ppk v{}", env!("CARGO_PKG_VERSION"));
            println!("Report schema version: {}", SCHEMA_VERSION);
            Ok(())
        }
    }
}
