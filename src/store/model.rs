//! Profile records held by a document.

use crate::mathexp::SymbolTable;
use crate::metrics::MetricSet;
use crate::utils::error::ExpressionError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::AddAssign;

/// Which of a profile's two readings to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// Attributed to the function alone
    Exclusive,
    /// Including every callee
    Inclusive,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Exclusive => f.write_str("exclusive"),
            Flavor::Inclusive => f.write_str("inclusive"),
        }
    }
}

/// Per-metric readings plus call counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub num_calls: f64,
    pub num_subroutine_calls: f64,
    pub exclusive: HashMap<String, f64>,
    pub inclusive: HashMap<String, f64>,
}

impl Profile {
    pub fn new(num_calls: f64, num_subroutine_calls: f64) -> Self {
        Self {
            num_calls,
            num_subroutine_calls,
            ..Self::default()
        }
    }

    /// Record both readings of one metric
    pub fn set(&mut self, metric: &str, exclusive: f64, inclusive: f64) {
        self.exclusive.insert(metric.to_string(), exclusive);
        self.inclusive.insert(metric.to_string(), inclusive);
    }

    pub fn values(&self, flavor: Flavor) -> &HashMap<String, f64> {
        match flavor {
            Flavor::Exclusive => &self.exclusive,
            Flavor::Inclusive => &self.inclusive,
        }
    }

    pub fn value(&self, metric: &str, flavor: Flavor) -> Option<f64> {
        self.values(flavor).get(metric).copied()
    }

    /// Evaluate `set` against each flavor and store the derived readings
    ///
    /// Each symbol table holds this profile's readings for one flavor
    /// overlaid with `meta`.
    pub fn update_derived(
        &mut self,
        set: &MetricSet,
        meta: &SymbolTable,
    ) -> Result<(), ExpressionError> {
        for flavor in [Flavor::Exclusive, Flavor::Inclusive] {
            let mut symtab = self.values(flavor).clone();
            symtab.extend(meta.iter().map(|(k, v)| (k.clone(), *v)));

            let derived = set.eval(&mut symtab)?;
            let target = match flavor {
                Flavor::Exclusive => &mut self.exclusive,
                Flavor::Inclusive => &mut self.inclusive,
            };
            target.extend(derived);
        }
        Ok(())
    }
}

/// Counts add; a metric new to `self` starts at the incoming reading
impl AddAssign<&Profile> for Profile {
    fn add_assign(&mut self, other: &Profile) {
        self.num_calls += other.num_calls;
        self.num_subroutine_calls += other.num_subroutine_calls;
        for (metric, &value) in &other.exclusive {
            self.exclusive
                .entry(metric.clone())
                .and_modify(|v| *v += value)
                .or_insert(value);
        }
        for (metric, &value) in &other.inclusive {
            self.inclusive
                .entry(metric.clone())
                .and_modify(|v| *v += value)
                .or_insert(value);
        }
    }
}

/// Raw readings of one event on one thread
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProfile {
    /// Index into the document's event table
    pub event_id: usize,
    pub profile: Profile,
}

/// Summary statistics of one user-defined counter on one thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserEventProfile {
    /// Index into the document's user event table
    pub user_event_id: usize,
    pub num_samples: i32,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum_squares: f64,
}

/// (node, context, thread) identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadKey {
    pub node: i32,
    pub context: i32,
    pub thread: i32,
}

impl ThreadKey {
    pub fn new(node: i32, context: i32, thread: i32) -> Self {
        Self {
            node,
            context,
            thread,
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.node, self.context, self.thread)
    }
}

/// Everything recorded for one thread
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    key: ThreadKey,
    metadata: BTreeMap<String, String>,
    function_profiles: Vec<FunctionProfile>,
    function_index: HashMap<usize, usize>,
    user_event_profiles: Vec<UserEventProfile>,
    /// Genuine profiles summed per short name
    aggregates: HashMap<String, Profile>,
}

impl Thread {
    pub fn new(key: ThreadKey) -> Self {
        Self {
            key,
            metadata: BTreeMap::new(),
            function_profiles: Vec::new(),
            function_index: HashMap::new(),
            user_event_profiles: Vec::new(),
            aggregates: HashMap::new(),
        }
    }

    pub fn key(&self) -> ThreadKey {
        self.key
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn insert_metadata(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(name.into(), value.into());
    }

    /// Raw profiles in insertion order
    pub fn function_profiles(&self) -> &[FunctionProfile] {
        &self.function_profiles
    }

    pub fn function_profile(&self, event_id: usize) -> Option<&FunctionProfile> {
        self.function_index
            .get(&event_id)
            .and_then(|&i| self.function_profiles.get(i))
    }

    pub fn user_event_profiles(&self) -> &[UserEventProfile] {
        &self.user_event_profiles
    }

    pub fn aggregate(&self, short_name: &str) -> Option<&Profile> {
        self.aggregates.get(short_name)
    }

    pub fn aggregates(&self) -> impl Iterator<Item = (&str, &Profile)> {
        self.aggregates.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Store a raw profile; false if the event is already present
    pub(crate) fn push_function_profile(&mut self, profile: FunctionProfile) -> bool {
        if self.function_index.contains_key(&profile.event_id) {
            return false;
        }
        self.function_index
            .insert(profile.event_id, self.function_profiles.len());
        self.function_profiles.push(profile);
        true
    }

    /// Fold a genuine profile into its short-name aggregate
    pub(crate) fn accumulate(&mut self, short_name: &str, profile: &Profile) {
        match self.aggregates.get_mut(short_name) {
            Some(aggregate) => *aggregate += profile,
            None => {
                self.aggregates
                    .insert(short_name.to_string(), profile.clone());
            }
        }
    }

    /// Store a user event profile; false if the user event is already present
    pub(crate) fn push_user_event_profile(&mut self, profile: UserEventProfile) -> bool {
        if self
            .user_event_profiles
            .iter()
            .any(|p| p.user_event_id == profile.user_event_id)
        {
            return false;
        }
        self.user_event_profiles.push(profile);
        true
    }

    pub(crate) fn profiles_mut(&mut self) -> impl Iterator<Item = &mut Profile> {
        self.function_profiles
            .iter_mut()
            .map(|fp| &mut fp.profile)
            .chain(self.aggregates.values_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricSet, SpecLibrary};

    fn profile(calls: f64, metrics: &[(&str, f64, f64)]) -> Profile {
        let mut p = Profile::new(calls, 0.0);
        for (m, e, i) in metrics {
            p.set(m, *e, *i);
        }
        p
    }

    #[test]
    fn test_add_assign_sums_and_adopts() {
        let mut agg = profile(1.0, &[("TIME", 10.0, 20.0)]);
        let other = profile(2.0, &[("TIME", 5.0, 5.0), ("PAPI_TOT_CYC", 7.0, 9.0)]);
        agg += &other;

        assert_eq!(agg.num_calls, 3.0);
        assert_eq!(agg.value("TIME", Flavor::Exclusive), Some(15.0));
        assert_eq!(agg.value("TIME", Flavor::Inclusive), Some(25.0));
        assert_eq!(agg.value("PAPI_TOT_CYC", Flavor::Exclusive), Some(7.0));
        assert_eq!(agg.value("PAPI_TOT_CYC", Flavor::Inclusive), Some(9.0));
    }

    #[test]
    fn test_add_assign_keeps_incoming_sign() {
        let mut agg = profile(1.0, &[]);
        agg += &profile(1.0, &[("DELTA", -0.0, 0.0)]);

        let adopted = agg.value("DELTA", Flavor::Exclusive).unwrap();
        assert!(adopted == 0.0 && adopted.is_sign_negative());
    }

    #[test]
    fn test_update_derived_per_flavor() {
        let mut set = MetricSet::new(SpecLibrary::default());
        set.add("INS_PER_CORE").unwrap();

        let mut p = profile(1.0, &[("PAPI_TOT_INS", 80.0, 160.0)]);
        let mut meta = SymbolTable::new();
        meta.insert("META_CORE_NUM".to_string(), 4.0);

        p.update_derived(&set, &meta).unwrap();
        assert_eq!(p.value("INS_PER_CORE", Flavor::Exclusive), Some(20.0));
        assert_eq!(p.value("INS_PER_CORE", Flavor::Inclusive), Some(40.0));
        assert!(p.value("META_CORE_NUM", Flavor::Exclusive).is_none());
    }

    #[test]
    fn test_thread_rejects_duplicate_event() {
        let mut thread = Thread::new(ThreadKey::new(0, 0, 0));
        let fp = FunctionProfile {
            event_id: 3,
            profile: Profile::default(),
        };
        assert!(thread.push_function_profile(fp.clone()));
        assert!(!thread.push_function_profile(fp));
        assert!(thread.function_profile(3).is_some());
        assert!(thread.function_profile(4).is_none());
    }

    #[test]
    fn test_thread_key_display() {
        assert_eq!(ThreadKey::new(1, 0, 7).to_string(), "1,0,7");
    }
}
