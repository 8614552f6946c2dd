use super::defects::EffectiveSeverities;
use crate::core::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DEFAULT_LEVEL: &str = "Medium";
const NOT_AVAILABLE: &str = "N/A";
const OPEN: &str = "Open";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyBug {
    pub id: String,
    pub module: String,
    pub severity: String,
    pub priority: String,
    pub status: String,
    pub assigned_to: String,
}

/// One entry per distinct bug id. Only rows naming a module are considered;
/// the first of them decides the bug's module, classification and assignee.
pub fn key_bugs(records: &[CanonicalRecord], severities: &EffectiveSeverities) -> Vec<KeyBug> {
    let mut seen = HashSet::new();
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.has_bug() && !r.module.is_empty())
        .filter(|(_, r)| seen.insert(r.bug_id.clone()))
        .map(|(index, record)| KeyBug {
            id: record.bug_id.clone(),
            module: record.module.clone(),
            severity: severities
                .get(index)
                .map(|s| s.to_string())
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            priority: record
                .priority
                .map(|p| p.to_string())
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            status: OPEN.to_string(),
            assigned_to: or_default(&record.tester, NOT_AVAILABLE),
        })
        .collect()
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Priority, Severity, TestResult};
    use crate::metrics::defects::effective_severities;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_occurrence_wins() {
        let records = vec![
            CanonicalRecord {
                bug_id: "BUG-1".into(),
                severity: Some(Severity::Critical),
                priority: Some(Priority::Highest),
                tester: "alice".into(),
                ..CanonicalRecord::new("Login", "TC1", TestResult::Fail)
            },
            CanonicalRecord {
                bug_id: "BUG-1".into(),
                severity: Some(Severity::Minor),
                tester: "bob".into(),
                ..CanonicalRecord::new("Cart", "TC2", TestResult::Fail)
            },
            CanonicalRecord {
                bug_id: "BUG-2".into(),
                ..CanonicalRecord::new("Search", "TC3", TestResult::Fail)
            },
        ];

        let bugs = key_bugs(&records, &effective_severities(&records));
        assert_eq!(
            bugs,
            vec![
                KeyBug {
                    id: "BUG-1".into(),
                    module: "Login".into(),
                    severity: "Critical".into(),
                    priority: "Highest".into(),
                    status: "Open".into(),
                    assigned_to: "alice".into(),
                },
                KeyBug {
                    id: "BUG-2".into(),
                    module: "Search".into(),
                    severity: "Medium".into(),
                    priority: "Medium".into(),
                    status: "Open".into(),
                    assigned_to: "N/A".into(),
                },
            ]
        );
    }

    #[test]
    fn test_rows_without_module_are_skipped() {
        let records = vec![
            CanonicalRecord {
                bug_id: "BUG-1".into(),
                tester: "ghost".into(),
                ..CanonicalRecord::new("", "TC1", TestResult::Fail)
            },
            CanonicalRecord {
                bug_id: "BUG-1".into(),
                ..CanonicalRecord::new("Login", "TC2", TestResult::Fail)
            },
            CanonicalRecord {
                bug_id: "BUG-2".into(),
                ..CanonicalRecord::new("", "TC3", TestResult::Fail)
            },
        ];

        let bugs = key_bugs(&records, &effective_severities(&records));
        assert_eq!(bugs.len(), 1);
        assert_eq!(bugs[0].id, "BUG-1");
        assert_eq!(bugs[0].module, "Login");
        assert_eq!(bugs[0].assigned_to, "N/A");
    }
}
