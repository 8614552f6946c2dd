//! Lookup tables for column labels and enumerated cell values.
//!
//! Every lookup takes the lower-cased, trimmed form of the input. A miss
//! returns `None`; callers decide the default.

use crate::core::{CanonicalColumn, Priority, Severity, TestResult};

const COLUMN_ALIASES: &[(&str, CanonicalColumn)] = &[
    ("module", CanonicalColumn::Module),
    ("testcaseid", CanonicalColumn::TestCaseId),
    ("test_case_id", CanonicalColumn::TestCaseId),
    ("testcase", CanonicalColumn::TestCaseId),
    ("tc_id", CanonicalColumn::TestCaseId),
    ("tcid", CanonicalColumn::TestCaseId),
    ("description", CanonicalColumn::Description),
    ("desc", CanonicalColumn::Description),
    ("run", CanonicalColumn::Run),
    ("result", CanonicalColumn::Result),
    ("status", CanonicalColumn::Result),
    ("outcome", CanonicalColumn::Result),
    ("bugid", CanonicalColumn::BugId),
    ("bug_id", CanonicalColumn::BugId),
    ("defect_id", CanonicalColumn::BugId),
    ("priority", CanonicalColumn::Priority),
    ("severity", CanonicalColumn::Severity),
    ("duration", CanonicalColumn::Duration),
    ("tester", CanonicalColumn::Tester),
    ("executed_by", CanonicalColumn::Tester),
];

const RESULT_ALIASES: &[(&str, TestResult)] = &[
    ("pass", TestResult::Pass),
    ("passed", TestResult::Pass),
    ("p", TestResult::Pass),
    ("fail", TestResult::Fail),
    ("failed", TestResult::Fail),
    ("f", TestResult::Fail),
    ("blocked", TestResult::Blocked),
    ("block", TestResult::Blocked),
    ("b", TestResult::Blocked),
    ("skip", TestResult::Skipped),
    ("skipped", TestResult::Skipped),
    ("s", TestResult::Skipped),
    ("not executed", TestResult::NotExecuted),
    ("not_executed", TestResult::NotExecuted),
    ("pending", TestResult::NotExecuted),
    ("", TestResult::NotExecuted),
];

const SEVERITY_ALIASES: &[(&str, Severity)] = &[
    ("critical", Severity::Critical),
    ("crit", Severity::Critical),
    ("1", Severity::Critical),
    ("major", Severity::Major),
    ("maj", Severity::Major),
    ("2", Severity::Major),
    ("medium", Severity::Medium),
    ("med", Severity::Medium),
    ("3", Severity::Medium),
    ("minor", Severity::Minor),
    ("min", Severity::Minor),
    ("4", Severity::Minor),
];

const PRIORITY_ALIASES: &[(&str, Priority)] = &[
    ("highest", Priority::Highest),
    ("high", Priority::High),
    ("medium", Priority::Medium),
    ("low", Priority::Low),
    ("1", Priority::Highest),
    ("2", Priority::High),
    ("3", Priority::Medium),
    ("4", Priority::Low),
];

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    let key = key.trim().to_lowercase();
    table
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, value)| *value)
}

/// Canonical column for an input label, ignoring case and surrounding
/// whitespace. Canonical names themselves resolve to their own column.
pub fn canonical_column(label: &str) -> Option<CanonicalColumn> {
    lookup(COLUMN_ALIASES, label)
}

pub fn result_alias(value: &str) -> Option<TestResult> {
    lookup(RESULT_ALIASES, value)
}

pub fn severity_alias(value: &str) -> Option<Severity> {
    lookup(SEVERITY_ALIASES, value)
}

pub fn priority_alias(value: &str) -> Option<Priority> {
    lookup(PRIORITY_ALIASES, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_aliases_are_case_and_space_insensitive() {
        assert_eq!(canonical_column("  STATUS "), Some(CanonicalColumn::Result));
        assert_eq!(canonical_column("Outcome"), Some(CanonicalColumn::Result));
        assert_eq!(canonical_column("TCID"), Some(CanonicalColumn::TestCaseId));
        assert_eq!(canonical_column("Executed_By"), Some(CanonicalColumn::Tester));
        assert_eq!(canonical_column("Defect_ID"), Some(CanonicalColumn::BugId));
        assert_eq!(canonical_column("notes"), None);
    }

    #[test]
    fn test_every_canonical_name_maps_to_itself() {
        for column in CanonicalColumn::ALL {
            assert_eq!(canonical_column(column.as_str()), Some(column));
        }
    }

    #[test]
    fn test_value_aliases() {
        assert_eq!(result_alias("PASSED"), Some(TestResult::Pass));
        assert_eq!(result_alias("f"), Some(TestResult::Fail));
        assert_eq!(result_alias("Not Executed"), Some(TestResult::NotExecuted));
        assert_eq!(result_alias("exploded"), None);
        assert_eq!(severity_alias("Crit"), Some(Severity::Critical));
        assert_eq!(severity_alias("4"), Some(Severity::Minor));
        assert_eq!(severity_alias("urgent"), None);
        assert_eq!(priority_alias("1"), Some(Priority::Highest));
        assert_eq!(priority_alias(" Low "), Some(Priority::Low));
        assert_eq!(priority_alias("p0"), None);
    }
}
