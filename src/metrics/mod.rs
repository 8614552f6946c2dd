//! Metrics engine: derives the immutable [`MetricsBundle`] for one report run.
//!
//! Computation order matters only for the severity fallback, which is
//! resolved once up front and then shared by the severity histogram, the
//! module densities and the key bug list.

pub mod defects;
pub mod density;
pub mod flaky;
pub mod key_bugs;
pub mod modules;
pub mod summary;

pub use defects::{PriorityHistogram, SeverityHistogram};
pub use density::{ModuleDensity, RiskLevel};
pub use key_bugs::KeyBug;
pub use modules::ModuleCoverage;
pub use summary::ExecutionSummary;

use crate::core::{CanonicalTable, Severity, TestResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub summary: ExecutionSummary,
    /// Sparse: modules without failures are absent.
    pub fail_by_module: BTreeMap<String, usize>,
    /// Dense over the four severities.
    pub defects_by_severity: SeverityHistogram,
    /// Dense over the four priorities.
    pub defects_by_priority: PriorityHistogram,
    pub density: BTreeMap<String, ModuleDensity>,
    pub flaky: Vec<String>,
    pub key_bugs: Vec<KeyBug>,
    pub module_coverage: BTreeMap<String, ModuleCoverage>,
    /// True when severities were derived from priorities for this run.
    pub severity_from_priority: bool,
}

impl Default for MetricsBundle {
    fn default() -> Self {
        Self {
            summary: ExecutionSummary::default(),
            fail_by_module: BTreeMap::new(),
            defects_by_severity: defects::empty_severity_histogram(),
            defects_by_priority: defects::empty_priority_histogram(),
            density: BTreeMap::new(),
            flaky: Vec::new(),
            key_bugs: Vec::new(),
            module_coverage: BTreeMap::new(),
            severity_from_priority: false,
        }
    }
}

impl MetricsBundle {
    pub fn critical_defects(&self) -> usize {
        self.severity_count(Severity::Critical)
    }

    pub fn major_defects(&self) -> usize {
        self.severity_count(Severity::Major)
    }

    pub fn severity_count(&self, severity: Severity) -> usize {
        self.defects_by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn total_defects(&self) -> usize {
        self.defects_by_severity.values().sum()
    }

    /// Failure count for a module; absent modules had none.
    pub fn failures_in(&self, module: &str) -> usize {
        self.fail_by_module.get(module).copied().unwrap_or(0)
    }
}

/// Compute every metric for a canonical table. Never fails; an empty table
/// yields zero counts and empty collections.
pub fn compute(table: &CanonicalTable) -> MetricsBundle {
    info!("Computing test execution metrics");

    if table.is_empty() {
        warn!("Empty table provided for metrics computation");
        return MetricsBundle::default();
    }

    let records = table.records();

    let summary = summary::summarize(records);
    info!(
        "Summary: {}/{} executed, {:.1}% pass rate",
        summary.executed, summary.total, summary.pass_pct
    );

    let fail_by_module = failures_by_module(table);
    debug!("Failures by module: {:?}", fail_by_module);

    let severities = defects::effective_severities(records);
    let defects_by_severity = defects::defects_by_severity(records, &severities);
    let defects_by_priority = defects::defects_by_priority(records);
    debug!("Defects by severity: {:?}", defects_by_severity);
    debug!("Defects by priority: {:?}", defects_by_priority);

    let density = density::defect_density(records, &severities);
    let flaky = flaky::flaky_tests(records);
    debug!("Found {} flaky tests", flaky.len());
    let key_bugs = key_bugs::key_bugs(records, &severities);
    debug!("Found {} unique bug ids", key_bugs.len());

    info!("Metrics computation completed");
    MetricsBundle {
        summary,
        fail_by_module,
        defects_by_severity,
        defects_by_priority,
        density,
        flaky,
        key_bugs,
        module_coverage: modules::module_coverage(records),
        severity_from_priority: severities.derived_from_priority(),
    }
}

fn failures_by_module(table: &CanonicalTable) -> BTreeMap<String, usize> {
    let mut failures = BTreeMap::new();
    for record in table.iter().filter(|r| r.result == TestResult::Fail) {
        *failures.entry(record.module.clone()).or_insert(0) += 1;
    }
    failures
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CanonicalRecord, Priority};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_table_yields_zero_bundle() {
        let bundle = compute(&CanonicalTable::default());
        assert_eq!(bundle.summary, ExecutionSummary::default());
        assert_eq!(bundle.defects_by_severity.len(), 4);
        assert_eq!(bundle.defects_by_priority.len(), 4);
        assert!(bundle.fail_by_module.is_empty());
        assert!(bundle.density.is_empty());
        assert!(bundle.flaky.is_empty());
        assert!(bundle.key_bugs.is_empty());
    }

    #[test]
    fn test_failures_by_module_is_sparse() {
        let table = CanonicalTable::new(vec![
            CanonicalRecord::new("Login", "TC1", TestResult::Fail),
            CanonicalRecord::new("Checkout", "TC2", TestResult::Fail),
            CanonicalRecord::new("Profile", "TC3", TestResult::Pass),
        ]);
        let bundle = compute(&table);
        assert_eq!(bundle.fail_by_module.get("Login"), Some(&1));
        assert_eq!(bundle.fail_by_module.get("Checkout"), Some(&1));
        assert!(!bundle.fail_by_module.contains_key("Profile"));
        assert_eq!(bundle.failures_in("Profile"), 0);
    }

    #[test]
    fn test_severity_fallback_does_not_touch_the_table() {
        let table = CanonicalTable::new(vec![CanonicalRecord {
            bug_id: "BUG-1".into(),
            priority: Some(Priority::Highest),
            ..CanonicalRecord::new("Login", "TC1", TestResult::Fail)
        }]);
        let bundle = compute(&table);
        assert!(bundle.severity_from_priority);
        assert_eq!(bundle.critical_defects(), 1);
        assert_eq!(bundle.key_bugs[0].severity, "Critical");
        assert_eq!(table.records()[0].severity, None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666_666, 2), 66.67);
        assert_eq!(round_to(0.333_333, 3), 0.333);
        assert_eq!(round_to(33.333_3, 1), 33.3);
    }

    mod properties {
        use super::*;
        use crate::core::CanonicalRecord;
        use proptest::prelude::*;

        fn record() -> impl Strategy<Value = CanonicalRecord> {
            (
                prop::sample::select(vec!["Login", "Cart", ""]),
                prop::sample::select(vec!["TC1", "TC2", "TC3", ""]),
                prop::sample::select(vec![
                    TestResult::Pass,
                    TestResult::Fail,
                    TestResult::Blocked,
                    TestResult::Skipped,
                    TestResult::NotExecuted,
                ]),
                prop::sample::select(vec!["", "BUG-1", "BUG-2"]),
            )
                .prop_map(|(module, tc, result, bug)| CanonicalRecord {
                    bug_id: bug.to_string(),
                    ..CanonicalRecord::new(module, tc, result)
                })
        }

        proptest! {
            #[test]
            fn summary_counts_are_consistent(records in prop::collection::vec(record(), 0..40)) {
                let bundle = compute(&CanonicalTable::new(records.clone()));
                let s = &bundle.summary;
                prop_assert_eq!(s.passed + s.failed + s.blocked, s.executed);
                prop_assert!(s.executed + s.skipped <= s.total);
                prop_assert_eq!(s.total, records.len());
                if s.executed == 0 {
                    prop_assert_eq!(s.pass_pct, 0.0);
                }
                prop_assert_eq!(bundle.defects_by_severity.len(), 4);
                prop_assert_eq!(bundle.defects_by_priority.len(), 4);
            }

            #[test]
            fn flaky_iff_pass_and_fail_observed(records in prop::collection::vec(record(), 0..40)) {
                let bundle = compute(&CanonicalTable::new(records.clone()));
                for tc in ["TC1", "TC2", "TC3"] {
                    let seen = |result: TestResult| {
                        records.iter().any(|r| r.test_case_id == tc && r.result == result)
                    };
                    let expected = seen(TestResult::Pass) && seen(TestResult::Fail);
                    prop_assert_eq!(bundle.flaky.iter().any(|f| f == tc), expected);
                }
                prop_assert!(!bundle.flaky.iter().any(|f| f.is_empty()));
            }
        }
    }
}
