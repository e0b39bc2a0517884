//! Classification of single profiler-emitted labels.
//!
//! A label nominally looks like `[TYPE] SIGNATURE [{FILE} LINES]`, but
//! instrumented timers omit the tag, MPI wrappers omit the location, and
//! failed PC resolution leaves a bare hex address. Classification is an
//! ordered list of rules; the first rule that claims a label decides it.

use crate::utils::config::{ROOT_EVENT, TOPLEVEL_EVENT, UNRESOLVED};
use crate::utils::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a single call-path frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionKind {
    Root,
    TopLevel,
    Sample,
    Callsite,
    Unwind,
    Context,
    Summary,
    Instru,
}

impl FunctionKind {
    /// Map a leading `[TAG]` to its kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "SAMPLE" => Some(Self::Sample),
            "CALLSITE" => Some(Self::Callsite),
            "UNWIND" => Some(Self::Unwind),
            "CONTEXT" => Some(Self::Context),
            "SUMMARY" => Some(Self::Summary),
            _ => None,
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Root => "ROOT",
            Self::TopLevel => "TOPLEVEL",
            Self::Sample => "SAMPLE",
            Self::Callsite => "CALLSITE",
            Self::Unwind => "UNWIND",
            Self::Context => "CONTEXT",
            Self::Summary => "SUMMARY",
            Self::Instru => "INSTRU",
        };
        f.write_str(name)
    }
}

/// Source location attached to a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,

    /// `N` or `START-END`; absent for `[{file}]` summaries
    pub line_range: Option<String>,
}

impl SourceLocation {
    /// Parse the line spec into an inclusive `(start, end)` pair
    pub fn lines(&self) -> Option<(u32, u32)> {
        let spec = self.line_range.as_deref()?;
        match spec.split_once('-') {
            Some((start, end)) => Some((start.trim().parse().ok()?, end.trim().parse().ok()?)),
            None => {
                let line = spec.parse().ok()?;
                Some((line, line))
            }
        }
    }
}

/// Parsed representation of one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionName {
    /// The label exactly as the profiler emitted it
    pub raw: String,
    pub kind: FunctionKind,
    pub location: Option<SourceLocation>,
    pub signature: String,
    pub resolved: bool,
}

impl FunctionName {
    pub fn source_file(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.file.as_str())
    }

    pub fn line_range(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.line_range.as_deref())
    }
}

/// A classification rule: `None` passes the label to the next rule
type Rule = fn(&str) -> Option<Result<FunctionName, ParseError>>;

/// Rules in precedence order
const RULES: &[(&str, Rule)] = &[
    ("root", rule_root),
    ("toplevel", rule_toplevel),
    ("address", rule_address),
    ("tagged", rule_tagged),
    ("instrumented", rule_instrumented),
];

/// Classify a single label
///
/// **Public** - pure function of the input, no shared state
///
/// # Errors
/// * `ParseError::InvalidFunctionName` - unknown tag or no extractable signature
pub fn parse_function_name(name: &str) -> Result<FunctionName, ParseError> {
    RULES
        .iter()
        .find_map(|(_, rule)| rule(name))
        .unwrap_or_else(|| Err(ParseError::InvalidFunctionName(name.to_string())))
}

fn rule_root(name: &str) -> Option<Result<FunctionName, ParseError>> {
    (name == ROOT_EVENT).then(|| {
        Ok(FunctionName {
            raw: name.to_string(),
            kind: FunctionKind::Root,
            location: None,
            signature: ROOT_EVENT.to_string(),
            resolved: true,
        })
    })
}

fn rule_toplevel(name: &str) -> Option<Result<FunctionName, ParseError>> {
    (name == TOPLEVEL_EVENT).then(|| {
        Ok(FunctionName {
            raw: name.to_string(),
            kind: FunctionKind::TopLevel,
            location: None,
            signature: "TOPLEVEL".to_string(),
            resolved: true,
        })
    })
}

fn rule_address(name: &str) -> Option<Result<FunctionName, ParseError>> {
    is_hex_address(name).then(|| {
        Ok(FunctionName {
            raw: name.to_string(),
            kind: FunctionKind::Sample,
            location: None,
            signature: name.to_string(),
            resolved: false,
        })
    })
}

fn rule_tagged(name: &str) -> Option<Result<FunctionName, ParseError>> {
    let rest = name.strip_prefix('[')?;
    let tag = &rest[..rest.find(']')?];

    let Some(kind) = FunctionKind::from_tag(tag) else {
        return Some(Err(ParseError::InvalidFunctionName(name.to_string())));
    };

    let signature = if is_unresolved_tagged(name) {
        UNRESOLVED.to_string()
    } else {
        match tagged_signature(name) {
            Some(sig) => sig,
            None => return Some(Err(ParseError::InvalidFunctionName(name.to_string()))),
        }
    };

    Some(Ok(finish(name, kind, signature)))
}

fn rule_instrumented(name: &str) -> Option<Result<FunctionName, ParseError>> {
    let end = trailing_location_start(name, true).unwrap_or(name.len());
    let signature = name[..end].trim().to_string();
    Some(Ok(finish(name, FunctionKind::Instru, signature)))
}

fn finish(name: &str, kind: FunctionKind, signature: String) -> FunctionName {
    FunctionName {
        raw: name.to_string(),
        kind,
        location: source_location(name),
        resolved: signature != UNRESOLVED,
        signature,
    }
}

/// `0x` followed by at least one lowercase hex digit
fn is_hex_address(name: &str) -> bool {
    name.strip_prefix("0x")
        .and_then(|rest| rest.chars().next())
        .map_or(false, |c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Trailing `[{FILE} LINESPEC]` group anchored at the end of the label
fn source_location(name: &str) -> Option<SourceLocation> {
    let body = name.strip_suffix(']')?;
    for (open, _) in body.match_indices("[{") {
        let inner = &body[open + 2..];
        if let Some(close) = inner.find('}') {
            let lines = inner[close + 1..].trim();
            return Some(SourceLocation {
                file: inner[..close].to_string(),
                line_range: (!lines.is_empty()).then(|| lines.to_string()),
            });
        }
    }
    None
}

/// Earliest offset from which the rest of the label is one or more
/// `[{FILE}...]` groups; `needs_space` requires a space after `}`.
fn trailing_location_start(name: &str, needs_space: bool) -> Option<usize> {
    if !name.ends_with(']') {
        return None;
    }
    let close = if needs_space { "} " } else { "}" };
    name.match_indices("[{")
        .map(|(open, _)| open)
        .find(|&open| name[open + 2..name.len() - 1].contains(close))
}

/// `[TAG] ... UNRESOLVED [plain]`
fn is_unresolved_tagged(name: &str) -> bool {
    let marker = format!(" {} ", UNRESOLVED);
    let Some(body) = name.strip_suffix(']') else {
        return false;
    };
    let Some(open) = body.rfind('[') else {
        return false;
    };
    if body[open + 1..].contains(']') {
        return false;
    }
    let head = &body[..open];
    let Some(marker_start) = head.len().checked_sub(marker.len()) else {
        return false;
    };
    head.ends_with(&marker) && head.find(']').map_or(false, |first| first < marker_start)
}

/// Text between a `]` and the trailing location groups, trimmed
fn tagged_signature(name: &str) -> Option<String> {
    for (close, _) in name.match_indices(']') {
        let after = &name[close + 1..];
        let seg_end = after.find(['[', ']']).unwrap_or(after.len());
        if seg_end == after.len() {
            return Some(after.trim().to_string());
        }
        let tail = &after[seg_end..];
        if tail.starts_with("[{") && trailing_location_start(tail, false) == Some(0) {
            return Some(after[..seg_end].trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root() {
        let f = parse_function_name(".TAU application").unwrap();
        assert_eq!(f.kind, FunctionKind::Root);
        assert!(f.resolved);
        assert_eq!(f.signature, ".TAU application");
        assert!(f.location.is_none());
    }

    #[test]
    fn test_toplevel() {
        let f = parse_function_name("[CONTEXT] .TAU application").unwrap();
        assert_eq!(f.kind, FunctionKind::TopLevel);
        assert_eq!(f.signature, "TOPLEVEL");
        assert!(f.resolved);
    }

    #[test]
    fn test_sample_with_location() {
        let f = parse_function_name("[SAMPLE] foo(int) [{a.c} 10]").unwrap();
        assert_eq!(f.kind, FunctionKind::Sample);
        assert_eq!(f.source_file(), Some("a.c"));
        assert_eq!(f.line_range(), Some("10"));
        assert_eq!(f.signature, "foo(int)");
        assert!(f.resolved);
    }

    #[test]
    fn test_bare_address() {
        let f = parse_function_name("0x7ffac0").unwrap();
        assert_eq!(f.kind, FunctionKind::Sample);
        assert!(!f.resolved);
        assert!(f.location.is_none());
        assert_eq!(f.signature, "0x7ffac0");
    }

    #[test]
    fn test_uppercase_hex_is_not_an_address() {
        let f = parse_function_name("0xABC").unwrap();
        assert_eq!(f.kind, FunctionKind::Instru);
    }

    #[test]
    fn test_instrumented_with_range() {
        let f = parse_function_name("int main(int, char **) [{pi.c} {12,1}-{40,1}]").unwrap();
        assert_eq!(f.kind, FunctionKind::Instru);
        assert_eq!(f.signature, "int main(int, char **)");
        assert_eq!(f.source_file(), Some("pi.c"));
    }

    #[test]
    fn test_instrumented_simple_range() {
        let f = parse_function_name("compute [{kernel.c} 10-42]").unwrap();
        let loc = f.location.unwrap();
        assert_eq!(loc.file, "kernel.c");
        assert_eq!(loc.lines(), Some((10, 42)));
        assert_eq!(f.signature, "compute");
    }

    #[test]
    fn test_instrumented_without_location() {
        let f = parse_function_name("MPI_Send()").unwrap();
        assert_eq!(f.kind, FunctionKind::Instru);
        assert_eq!(f.signature, "MPI_Send()");
        assert!(f.location.is_none());
        assert!(f.resolved);
    }

    #[test]
    fn test_summary_file_only() {
        let f = parse_function_name("[SUMMARY] solve [{solver.c}]").unwrap();
        assert_eq!(f.kind, FunctionKind::Summary);
        assert_eq!(f.signature, "solve");
        assert_eq!(f.source_file(), Some("solver.c"));
        assert_eq!(f.line_range(), None);
    }

    #[test]
    fn test_unresolved_tagged() {
        let f = parse_function_name("[UNWIND] libc.so UNRESOLVED [0x400a10]").unwrap();
        assert_eq!(f.kind, FunctionKind::Unwind);
        assert_eq!(f.signature, "UNRESOLVED");
        assert!(!f.resolved);
    }

    #[test]
    fn test_unresolved_with_location_group() {
        let f = parse_function_name("[SAMPLE] UNRESOLVED [{x.so} 0x10]").unwrap();
        assert_eq!(f.signature, "UNRESOLVED");
        assert!(!f.resolved);
    }

    #[test]
    fn test_callsite() {
        let f = parse_function_name("[CALLSITE] MPI_Recv() [{comm.c} 77]").unwrap();
        assert_eq!(f.kind, FunctionKind::Callsite);
        assert_eq!(f.signature, "MPI_Recv()");
        assert_eq!(f.line_range(), Some("77"));
    }

    #[test]
    fn test_unknown_tag_is_error() {
        assert!(matches!(
            parse_function_name("[BOGUS] foo"),
            Err(ParseError::InvalidFunctionName(_))
        ));
    }

    #[test]
    fn test_tagged_without_signature_is_error() {
        assert!(matches!(
            parse_function_name("[SAMPLE] foo ["),
            Err(ParseError::InvalidFunctionName(_))
        ));
    }

    #[test]
    fn test_tagged_trailing_plain_group_leaves_empty_signature() {
        let f = parse_function_name("[SAMPLE] foo [bar]").unwrap();
        assert_eq!(f.signature, "");
        assert!(f.resolved);
    }

    #[test]
    fn test_rule_precedence_is_root_first() {
        assert_eq!(RULES[0].0, "root");
        assert!(rule_address(".TAU application").is_none());
        assert!(rule_root("0x10").is_none());
        assert!(rule_tagged("plain").is_none());
    }
}
