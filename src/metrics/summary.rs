use super::round_to;
use crate::core::{CanonicalRecord, TestResult};
use serde::{Deserialize, Serialize};

/// Headline execution counts for one report run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub executed: usize,
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
    pub skipped: usize,
    /// passed / executed * 100, two decimals; 0.0 when nothing executed
    pub pass_pct: f64,
}

pub fn summarize(records: &[CanonicalRecord]) -> ExecutionSummary {
    let count = |result: TestResult| records.iter().filter(|r| r.result == result).count();

    let passed = count(TestResult::Pass);
    let failed = count(TestResult::Fail);
    let blocked = count(TestResult::Blocked);
    let executed = records.iter().filter(|r| r.result.is_executed()).count();

    ExecutionSummary {
        total: records.len(),
        executed,
        passed,
        failed,
        blocked,
        skipped: count(TestResult::Skipped),
        pass_pct: pass_percentage(passed, executed),
    }
}

pub(crate) fn pass_percentage(passed: usize, executed: usize) -> f64 {
    if executed == 0 {
        return 0.0;
    }
    round_to(passed as f64 / executed as f64 * 100.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(results: &[TestResult]) -> Vec<CanonicalRecord> {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| CanonicalRecord::new("M", &format!("TC{}", i), *r))
            .collect()
    }

    #[test]
    fn test_summary_counts() {
        let summary = summarize(&rows(&[
            TestResult::Pass,
            TestResult::Pass,
            TestResult::Fail,
            TestResult::Blocked,
            TestResult::Skipped,
            TestResult::NotExecuted,
        ]));
        assert_eq!(summary.total, 6);
        assert_eq!(summary.executed, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.pass_pct, 50.0);
    }

    #[test]
    fn test_pass_pct_is_zero_without_executions() {
        let summary = summarize(&rows(&[TestResult::Skipped, TestResult::NotExecuted]));
        assert_eq!(summary.executed, 0);
        assert_eq!(summary.pass_pct, 0.0);
    }

    #[test]
    fn test_pass_pct_rounds_to_two_decimals() {
        assert_eq!(pass_percentage(2, 3), 66.67);
        assert_eq!(pass_percentage(1, 3), 33.33);
    }
}
