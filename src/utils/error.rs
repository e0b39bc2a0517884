//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised while reading or writing the packed wire format
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Truncated buffer at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Invalid PPK format: {0}")]
    InvalidFormat(String),

    #[error("Incompatible packed profile (compatibility level {0} > 2), please upgrade")]
    IncompatibleVersion(i32),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while classifying profiler-emitted labels
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse function name `{0}`")]
    InvalidFunctionName(String),

    #[error("Failed to parse event name `{0}`")]
    InvalidEvent(String),

    #[error("Invalid hotspot pattern: {0}")]
    InvalidHotspot(#[from] regex::Error),
}

/// Errors raised by the expression engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Unresolved symbol: `{0}`")]
    UnresolvedSymbol(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Mismatched parentheses")]
    MismatchedParentheses,

    #[error("Modulo by zero")]
    ModuloByZero,
}

/// Errors raised while resolving a metric set
#[derive(Error, Debug)]
pub enum MetricSetError {
    #[error("No specification found for derived metric `{0}`")]
    MissingMetricSpec(String),

    #[error("Empty spec for derived metric `{0}`")]
    EmptySpec(String),

    #[error("Invalid metric label `{0}`")]
    InvalidLabel(String),

    #[error("Derived metric `{0}` depends on itself")]
    CyclicDependency(String),

    #[error("Invalid expression for metric `{metric}`: {source}")]
    Expression {
        metric: String,
        #[source]
        source: ExpressionError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the in-memory document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("Thread# {0} does not exist")]
    NoSuchThread(usize),

    #[error("Event `{0}` does not exist")]
    NoSuchEvent(String),

    #[error("Metric `{0}` does not exist")]
    NoSuchMetric(String),

    #[error("MetricSet is bigger than document metrics, missing: {0:?}")]
    MetricSetTooWide(Vec<String>),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors raised while loading an analysis configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
