use super::summary::pass_percentage;
use crate::core::{CanonicalRecord, TestResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-module execution coverage shown in the "modules covered" table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleCoverage {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

pub fn module_coverage(records: &[CanonicalRecord]) -> BTreeMap<String, ModuleCoverage> {
    let mut executed: BTreeMap<String, usize> = BTreeMap::new();
    let mut coverage: BTreeMap<String, ModuleCoverage> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.module.is_empty()) {
        let entry = coverage.entry(record.module.clone()).or_default();
        entry.total += 1;
        match record.result {
            TestResult::Pass => entry.passed += 1,
            TestResult::Fail => entry.failed += 1,
            _ => {}
        }
        if record.result.is_executed() {
            *executed.entry(record.module.clone()).or_insert(0) += 1;
        }
    }

    for (module, entry) in coverage.iter_mut() {
        let ran = executed.get(module).copied().unwrap_or(0);
        entry.pass_rate = pass_percentage(entry.passed, ran);
    }
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_coverage() {
        let records = vec![
            CanonicalRecord::new("Login", "TC1", TestResult::Pass),
            CanonicalRecord::new("Login", "TC2", TestResult::Fail),
            CanonicalRecord::new("Login", "TC3", TestResult::Skipped),
            CanonicalRecord::new("Cart", "TC4", TestResult::NotExecuted),
            CanonicalRecord::new("", "TC5", TestResult::Pass),
        ];
        let coverage = module_coverage(&records);

        assert_eq!(coverage.len(), 2);
        let login = &coverage["Login"];
        assert_eq!((login.total, login.passed, login.failed), (3, 1, 1));
        assert_eq!(login.pass_rate, 50.0);
        assert_eq!(coverage["Cart"].pass_rate, 0.0);
    }
}
