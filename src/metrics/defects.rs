//! Defect histograms and the priority-to-severity fallback.
//!
//! Histograms are dense: all four categories are always present, with zero
//! counts where nothing was observed. Only rows that carry both a bug id and
//! the respective classification are counted, once per row.

use crate::core::{CanonicalRecord, Priority, Severity};
use std::collections::BTreeMap;
use tracing::info;

pub type SeverityHistogram = BTreeMap<Severity, usize>;
pub type PriorityHistogram = BTreeMap<Priority, usize>;

/// Per-row severities used for the rest of a metrics computation.
///
/// This is a working copy. The canonical table is never rewritten, so
/// consumers that read the table directly still see the original blanks.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveSeverities {
    values: Vec<Option<Severity>>,
    derived_from_priority: bool,
}

impl EffectiveSeverities {
    pub fn get(&self, index: usize) -> Option<Severity> {
        self.values.get(index).copied().flatten()
    }

    pub fn derived_from_priority(&self) -> bool {
        self.derived_from_priority
    }
}

/// Resolve the severity of every row. When no row in the whole dataset has a
/// severity but at least one has a priority, severities are derived from
/// priorities row by row.
pub fn effective_severities(records: &[CanonicalRecord]) -> EffectiveSeverities {
    let any_severity = records.iter().any(|r| r.severity.is_some());
    let any_priority = records.iter().any(|r| r.priority.is_some());

    if !any_severity && any_priority {
        info!("No severity data found, mapping priority to severity");
        return EffectiveSeverities {
            values: records
                .iter()
                .map(|r| r.priority.map(Severity::from_priority))
                .collect(),
            derived_from_priority: true,
        };
    }

    EffectiveSeverities {
        values: records.iter().map(|r| r.severity).collect(),
        derived_from_priority: false,
    }
}

pub fn empty_severity_histogram() -> SeverityHistogram {
    Severity::ALL.into_iter().map(|s| (s, 0)).collect()
}

pub fn empty_priority_histogram() -> PriorityHistogram {
    Priority::ALL.into_iter().map(|p| (p, 0)).collect()
}

pub fn defects_by_severity(
    records: &[CanonicalRecord],
    severities: &EffectiveSeverities,
) -> SeverityHistogram {
    let mut histogram = empty_severity_histogram();
    for (index, record) in records.iter().enumerate() {
        if !record.has_bug() {
            continue;
        }
        if let Some(severity) = severities.get(index) {
            *histogram.entry(severity).or_insert(0) += 1;
        }
    }
    histogram
}

pub fn defects_by_priority(records: &[CanonicalRecord]) -> PriorityHistogram {
    let mut histogram = empty_priority_histogram();
    for record in records.iter().filter(|r| r.has_bug()) {
        if let Some(priority) = record.priority {
            *histogram.entry(priority).or_insert(0) += 1;
        }
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TestResult;

    fn defect(bug: &str, severity: Option<Severity>, priority: Option<Priority>) -> CanonicalRecord {
        CanonicalRecord {
            bug_id: bug.to_string(),
            severity,
            priority,
            ..CanonicalRecord::new("Login", "TC", TestResult::Fail)
        }
    }

    #[test]
    fn test_histograms_are_dense_without_defects() {
        let records = vec![CanonicalRecord::new("Login", "TC1", TestResult::Pass)];
        let severities = effective_severities(&records);
        let by_sev = defects_by_severity(&records, &severities);
        let by_pri = defects_by_priority(&records);
        assert_eq!(by_sev.len(), 4);
        assert!(by_sev.values().all(|c| *c == 0));
        assert_eq!(by_pri.len(), 4);
        assert!(by_pri.values().all(|c| *c == 0));
    }

    #[test]
    fn test_rows_without_bug_id_are_not_counted() {
        let records = vec![
            defect("", Some(Severity::Critical), Some(Priority::Highest)),
            defect("BUG-1", Some(Severity::Major), None),
        ];
        let severities = effective_severities(&records);
        let by_sev = defects_by_severity(&records, &severities);
        assert_eq!(by_sev[&Severity::Critical], 0);
        assert_eq!(by_sev[&Severity::Major], 1);
        assert_eq!(defects_by_priority(&records)[&Priority::Highest], 0);
    }

    #[test]
    fn test_priority_fallback_only_when_no_severity_anywhere() {
        let records = vec![
            defect("BUG-1", None, Some(Priority::Highest)),
            defect("BUG-2", None, Some(Priority::High)),
        ];
        let severities = effective_severities(&records);
        assert!(severities.derived_from_priority());
        let by_sev = defects_by_severity(&records, &severities);
        assert_eq!(by_sev[&Severity::Critical], 1);
        assert_eq!(by_sev[&Severity::Major], 1);
        assert_eq!(by_sev[&Severity::Medium], 0);
        assert_eq!(by_sev[&Severity::Minor], 0);
    }

    #[test]
    fn test_single_severity_disables_fallback() {
        let records = vec![
            defect("BUG-1", None, Some(Priority::Highest)),
            defect("BUG-2", Some(Severity::Minor), Some(Priority::High)),
        ];
        let severities = effective_severities(&records);
        assert!(!severities.derived_from_priority());
        let by_sev = defects_by_severity(&records, &severities);
        assert_eq!(by_sev[&Severity::Critical], 0);
        assert_eq!(by_sev[&Severity::Minor], 1);
    }
}
