//! Indentation for nested console output.
//!
//! Callers pass the nesting depth explicitly instead of shifting a
//! shared indentation level.

/// Width of one nesting level
const INDENT_WIDTH: usize = 4;

/// Prefix for a line printed at `depth`
pub fn indent(depth: usize) -> String {
    " ".repeat(depth * INDENT_WIDTH)
}

/// Format `msg` as a `#`-prefixed note at `depth`
pub fn note(depth: usize, msg: &str) -> String {
    format!("{}# {}", indent(depth), msg)
}
