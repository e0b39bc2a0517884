//! Derived metric resolution and evaluation.
//!
//! A `MetricSet` is built from metric labels (`NAME` or `NAME@interval`).
//! Native counters are recorded with their sampling interval; derived
//! metrics pull their spec file from a [`SpecLibrary`] and recursively
//! register everything that file references. `derived_metrics()`
//! is always in dependency order.

use super::spec::SpecLibrary;
use crate::mathexp::{MathExp, SymbolTable};
use crate::utils::config::{DEFAULT_SAMPLING_INTERVAL, META_PREFIX, NATIVE_NAMES, NATIVE_PREFIX};
use crate::utils::error::{ExpressionError, MetricSetError};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// True unless the metric is a hardware counter or wall-clock time
pub fn is_derived(metric: &str) -> bool {
    if metric.starts_with(NATIVE_PREFIX) {
        return false;
    }
    let upper = metric.to_uppercase();
    !NATIVE_NAMES.contains(&upper.as_str())
}

/// Requested metrics with their dependencies resolved
#[derive(Debug, Clone)]
pub struct MetricSet {
    library: SpecLibrary,
    native: BTreeSet<String>,
    interval: BTreeMap<String, u64>,
    derived: Vec<String>,
    expressions: HashMap<String, Vec<MathExp>>,
    /// Derived metrics currently being resolved, outermost first
    resolving: Vec<String>,
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::new(SpecLibrary::default())
    }
}

impl MetricSet {
    pub fn new(library: SpecLibrary) -> Self {
        Self {
            library,
            native: BTreeSet::new(),
            interval: BTreeMap::new(),
            derived: Vec::new(),
            expressions: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    /// Build a set from several labels
    pub fn from_labels<S: AsRef<str>>(
        library: SpecLibrary,
        labels: &[S],
    ) -> Result<Self, MetricSetError> {
        let mut set = Self::new(library);
        for label in labels {
            set.add(label.as_ref())?;
        }
        Ok(set)
    }

    /// Register a metric label, `NAME` or `NAME@interval`
    ///
    /// **Public** - main entry point for building a metric set
    ///
    /// `META_` names are system metadata and are skipped.
    ///
    /// # Errors
    /// * `MetricSetError::InvalidLabel` - empty name or non-numeric interval
    /// * `MetricSetError::MissingMetricSpec` - a derived metric has no spec
    /// * `MetricSetError::EmptySpec` - a spec holds no expression
    /// * `MetricSetError::CyclicDependency` - two derived metrics reference each other
    /// * `MetricSetError::Expression` - a spec line does not compile
    pub fn add(&mut self, label: &str) -> Result<(), MetricSetError> {
        let (name, interval) = parse_label(label)?;

        if name.starts_with(META_PREFIX) {
            debug!("Skipping metadata name {}", name);
            return Ok(());
        }

        if is_derived(name) {
            let result = self.add_derived(name, interval);
            self.resolving.clear();
            result
        } else {
            self.add_native(name, interval);
            Ok(())
        }
    }

    fn add_native(&mut self, name: &str, interval: u64) {
        self.native.insert(name.to_string());
        self.interval.insert(name.to_string(), interval);
    }

    fn add_derived(&mut self, metric: &str, interval: u64) -> Result<(), MetricSetError> {
        if self.derived.iter().any(|m| m == metric) {
            return Ok(());
        }
        if self.resolving.iter().any(|m| m == metric) {
            return Err(MetricSetError::CyclicDependency(metric.to_string()));
        }

        let lines = self.library.lookup(metric)?;
        debug!("Resolving derived metric {} ({} clauses)", metric, lines.len());

        self.resolving.push(metric.to_string());
        let clauses = self.resolve_clauses(metric, &lines, interval);
        self.resolving.pop();
        let clauses = clauses?;

        if clauses.is_empty() {
            return Err(MetricSetError::EmptySpec(metric.to_string()));
        }

        self.derived.push(metric.to_string());
        self.expressions.insert(metric.to_string(), clauses);
        Ok(())
    }

    /// Compile every clause of `metric` and register what it references.
    /// Names assigned by the clauses themselves are local. Natives named
    /// directly take `interval`; nested derived metrics are added as bare
    /// labels and so sample at the default interval.
    fn resolve_clauses(
        &mut self,
        metric: &str,
        lines: &[String],
        interval: u64,
    ) -> Result<Vec<MathExp>, MetricSetError> {
        let mut locals: Vec<String> = vec![metric.to_string()];
        let mut clauses = Vec::with_capacity(lines.len());

        for line in lines {
            let exp = MathExp::parse(line).map_err(|source| MetricSetError::Expression {
                metric: metric.to_string(),
                source,
            })?;
            locals.extend(exp.assigned().iter().cloned());

            for var in exp.variables() {
                if locals.contains(var) || var.starts_with(META_PREFIX) {
                    continue;
                }
                if is_derived(var) {
                    self.add_derived(var, DEFAULT_SAMPLING_INTERVAL)?;
                } else {
                    self.add_native(var, interval);
                }
            }
            clauses.push(exp);
        }

        Ok(clauses)
    }

    /// Evaluate every derived metric against `symtab`, in dependency order
    ///
    /// A derived metric already present in `symtab` keeps that value. Results
    /// are written back into `symtab` so later metrics can use them.
    ///
    /// # Errors
    /// * `ExpressionError::UnresolvedSymbol` - a referenced value is missing
    pub fn eval(&self, symtab: &mut SymbolTable) -> Result<Vec<(String, f64)>, ExpressionError> {
        let mut values = Vec::with_capacity(self.derived.len());

        for metric in &self.derived {
            let value = match symtab.get(metric) {
                Some(v) => *v,
                None => {
                    let mut last = None;
                    for exp in self.expressions(metric) {
                        last = Some(exp.eval(symtab)?);
                    }
                    last.ok_or_else(|| {
                        ExpressionError::Syntax(format!("no expression for `{}`", metric))
                    })?
                }
            };
            symtab.insert(metric.clone(), value);
            values.push((metric.clone(), value));
        }

        Ok(values)
    }

    pub fn native_metrics(&self) -> &BTreeSet<String> {
        &self.native
    }

    pub fn derived_metrics(&self) -> &[String] {
        &self.derived
    }

    pub fn interval(&self, native: &str) -> Option<u64> {
        self.interval.get(native).copied()
    }

    /// Compiled clauses of a derived metric (empty if unknown)
    pub fn expressions(&self, derived: &str) -> &[MathExp] {
        self.expressions.get(derived).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.native.is_empty() && self.derived.is_empty()
    }

    /// `NAME@interval` for every hardware counter, for sampling tools
    pub fn sampling_events(&self) -> Vec<String> {
        self.native
            .iter()
            .filter(|m| is_counter(m))
            .map(|m| {
                let interval = self.interval(m).unwrap_or(DEFAULT_SAMPLING_INTERVAL);
                format!("{}@{}", m, interval)
            })
            .collect()
    }
}

/// Wall-clock time is measured, never sampled
fn is_counter(native: &str) -> bool {
    native.starts_with(NATIVE_PREFIX)
}

fn parse_label(label: &str) -> Result<(&str, u64), MetricSetError> {
    let label = label.trim();
    let (name, interval) = match label.split_once('@') {
        Some((name, interval)) => {
            let interval = interval
                .trim()
                .parse::<u64>()
                .map_err(|_| MetricSetError::InvalidLabel(label.to_string()))?;
            (name.trim(), interval)
        }
        None => (label, DEFAULT_SAMPLING_INTERVAL),
    };

    if name.is_empty() {
        return Err(MetricSetError::InvalidLabel(label.to_string()));
    }
    Ok((name, interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;

    fn write_spec(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn library(dir: &Path) -> SpecLibrary {
        SpecLibrary::without_bundled(vec![dir.to_path_buf()])
    }

    #[test]
    fn test_is_derived() {
        assert!(!is_derived("PAPI_TOT_CYC"));
        assert!(!is_derived("TIME"));
        assert!(!is_derived("time"));
        assert!(is_derived("IPC"));
        assert!(is_derived("TIME_PER_CALL"));
    }

    #[test]
    fn test_dependency_order() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "D1", "D1 = D2 * 2\n");
        write_spec(dir.path(), "D2", "D2 = PAPI_A + 1\n");

        let mut set = MetricSet::new(library(dir.path()));
        set.add("D1").unwrap();

        assert_eq!(set.derived_metrics(), &["D2".to_string(), "D1".to_string()]);
        assert!(set.native_metrics().contains("PAPI_A"));
    }

    #[test]
    fn test_native_interval() {
        let mut set = MetricSet::new(SpecLibrary::without_bundled(Vec::new()));
        set.add("PAPI_TOT_CYC@5000").unwrap();
        set.add("TIME").unwrap();

        assert_eq!(set.interval("PAPI_TOT_CYC"), Some(5000));
        assert_eq!(set.interval("TIME"), Some(DEFAULT_SAMPLING_INTERVAL));
        assert_eq!(set.sampling_events(), vec!["PAPI_TOT_CYC@5000".to_string()]);
    }

    #[test]
    fn test_derived_interval_reaches_natives() {
        let mut set = MetricSet::default();
        set.add("IPC@250").unwrap();

        assert_eq!(set.interval("PAPI_TOT_INS"), Some(250));
        assert_eq!(set.interval("PAPI_TOT_CYC"), Some(250));
    }

    #[test]
    fn test_nested_derived_uses_default_interval() {
        let mut set = MetricSet::default();
        set.add("CPI@250").unwrap();

        assert_eq!(set.derived_metrics(), &["IPC".to_string(), "CPI".to_string()]);
        assert_eq!(set.interval("PAPI_TOT_INS"), Some(DEFAULT_SAMPLING_INTERVAL));
        assert_eq!(set.interval("PAPI_TOT_CYC"), Some(DEFAULT_SAMPLING_INTERVAL));
    }

    #[test]
    fn test_meta_names_skipped() {
        let mut set = MetricSet::default();
        set.add("META_CORE_NUM").unwrap();
        assert!(set.is_empty());

        set.add("INS_PER_CORE").unwrap();
        assert_eq!(
            set.native_metrics().iter().collect::<Vec<_>>(),
            vec!["PAPI_TOT_INS"]
        );
    }

    #[test]
    fn test_local_assignment_is_not_a_dependency() {
        let mut set = MetricSet::default();
        set.add("FLOPS").unwrap();

        assert_eq!(set.derived_metrics(), &["FLOPS".to_string()]);
        assert_eq!(set.expressions("FLOPS").len(), 2);
        assert!(set.native_metrics().contains("TIME"));
        assert!(set.native_metrics().contains("PAPI_FP_OPS"));
    }

    #[test]
    fn test_eval_in_order_with_shared_symtab() {
        let mut set = MetricSet::default();
        set.add("CPI").unwrap();
        assert_eq!(set.derived_metrics(), &["IPC".to_string(), "CPI".to_string()]);

        let mut symtab = SymbolTable::new();
        symtab.insert("PAPI_TOT_INS".to_string(), 400.0);
        symtab.insert("PAPI_TOT_CYC".to_string(), 200.0);

        let values = set.eval(&mut symtab).unwrap();
        assert_eq!(
            values,
            vec![("IPC".to_string(), 2.0), ("CPI".to_string(), 0.5)]
        );
        assert_eq!(symtab["CPI"], 0.5);
    }

    #[test]
    fn test_eval_keeps_caller_override() {
        let mut set = MetricSet::default();
        set.add("CPI").unwrap();

        let mut symtab = SymbolTable::new();
        symtab.insert("IPC".to_string(), 4.0);

        let values = set.eval(&mut symtab).unwrap();
        assert_eq!(values[1], ("CPI".to_string(), 0.25));
    }

    #[test]
    fn test_eval_unresolved() {
        let mut set = MetricSet::default();
        set.add("IPC").unwrap();

        let result = set.eval(&mut SymbolTable::new());
        assert!(matches!(result, Err(ExpressionError::UnresolvedSymbol(_))));
    }

    #[test]
    fn test_missing_and_empty_spec() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "EMPTY", "# nothing here\n\n");

        let mut set = MetricSet::new(library(dir.path()));
        assert!(matches!(
            set.add("NOPE"),
            Err(MetricSetError::MissingMetricSpec(name)) if name == "NOPE"
        ));
        assert!(matches!(
            set.add("EMPTY"),
            Err(MetricSetError::EmptySpec(name)) if name == "EMPTY"
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "A", "A = B + 1\n");
        write_spec(dir.path(), "B", "B = A * 2\n");

        let mut set = MetricSet::new(library(dir.path()));
        assert!(matches!(
            set.add("A"),
            Err(MetricSetError::CyclicDependency(name)) if name == "A"
        ));
        assert!(set.derived_metrics().is_empty());
    }

    #[test]
    fn test_bad_spec_line() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "BAD", "BAD = (PAPI_A + 1\n");

        let mut set = MetricSet::new(library(dir.path()));
        assert!(matches!(
            set.add("BAD"),
            Err(MetricSetError::Expression { metric, source: ExpressionError::MismatchedParentheses })
                if metric == "BAD"
        ));
    }

    #[test]
    fn test_invalid_labels() {
        let mut set = MetricSet::default();
        assert!(matches!(set.add("@100"), Err(MetricSetError::InvalidLabel(_))));
        assert!(matches!(
            set.add("PAPI_TOT_CYC@fast"),
            Err(MetricSetError::InvalidLabel(_))
        ));
    }
}
