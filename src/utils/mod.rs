//! Utility modules for configuration, error handling, and console output.

pub mod config;
pub mod error;
pub mod indent;

// Re-export commonly used error types for convenience
pub use error::{
    CodecError, ConfigError, DocumentError, ExpressionError, MetricSetError, OutputError,
    ParseError,
};
