use crate::core::{CanonicalRecord, TestResult};
use std::collections::HashMap;

/// Test case ids observed with both a Pass and a Fail, in first-seen order.
/// Blocked and skipped results have no bearing on flakiness.
pub fn flaky_tests(records: &[CanonicalRecord]) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut seen: HashMap<&str, (bool, bool)> = HashMap::new();

    for record in records.iter().filter(|r| !r.test_case_id.is_empty()) {
        let id = record.test_case_id.as_str();
        let entry = seen.entry(id).or_insert_with(|| {
            order.push(id);
            (false, false)
        });
        match record.result {
            TestResult::Pass => entry.0 = true,
            TestResult::Fail => entry.1 = true,
            _ => {}
        }
    }

    order
        .into_iter()
        .filter(|id| seen.get(id).is_some_and(|&(pass, fail)| pass && fail))
        .map(String::from)
        .collect()
}
