//! Canonicalizer: maps arbitrary input columns and values onto the
//! ten-column canonical schema.
//!
//! Normalization never fails. Unknown columns are dropped, missing columns
//! are synthesized, and every value that does not resolve falls back to its
//! column default:
//!
//! | Column | Default |
//! |--------|---------|
//! | `Result` | `Not Executed` |
//! | `Severity`, `Priority` | empty |
//! | `Run` | `1` |
//! | everything else | empty string |

pub mod aliases;

use crate::core::{
    CanonicalColumn, CanonicalRecord, CanonicalTable, Priority, RawRecordSet, RawRow, RawValue,
    Severity, TestResult,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub use aliases::canonical_column;

/// Normalize a raw record set into canonical rows.
pub fn normalize(raw: &RawRecordSet) -> CanonicalTable {
    if raw.is_empty() {
        warn!("Empty record set provided; producing canonical columns only");
    }

    let mapping = column_mapping(raw.columns());
    for (label, column) in &mapping {
        debug!("Mapped column '{}' to '{}'", label, column);
    }
    for column in CanonicalColumn::ALL {
        if !mapping.values().any(|c| *c == column) {
            debug!("Added missing column: {}", column);
        }
    }

    let records: Vec<CanonicalRecord> = raw
        .rows()
        .iter()
        .map(|row| normalize_row(row, &mapping))
        .collect();

    info!(
        "Normalized {} rows with {} columns",
        records.len(),
        CanonicalColumn::ALL.len()
    );
    CanonicalTable::new(records)
}

/// Label -> canonical column for every input label that has an alias.
fn column_mapping(columns: &[String]) -> HashMap<String, CanonicalColumn> {
    columns
        .iter()
        .filter_map(|label| canonical_column(label).map(|column| (label.clone(), column)))
        .collect()
}

/// First non-blank value among the input cells mapped to `column`.
fn cell<'a>(
    row: &'a RawRow,
    mapping: &HashMap<String, CanonicalColumn>,
    column: CanonicalColumn,
) -> Option<&'a RawValue> {
    row.iter()
        .filter(|(label, _)| mapping.get(*label) == Some(&column))
        .map(|(_, value)| value)
        .find(|value| !value.is_blank())
}

fn text(row: &RawRow, mapping: &HashMap<String, CanonicalColumn>, column: CanonicalColumn) -> String {
    cell(row, mapping, column)
        .map(RawValue::as_text)
        .unwrap_or_default()
}

fn normalize_row(row: &RawRow, mapping: &HashMap<String, CanonicalColumn>) -> CanonicalRecord {
    CanonicalRecord {
        module: text(row, mapping, CanonicalColumn::Module),
        test_case_id: text(row, mapping, CanonicalColumn::TestCaseId),
        description: text(row, mapping, CanonicalColumn::Description),
        run: parse_run(cell(row, mapping, CanonicalColumn::Run)),
        result: parse_result(&text(row, mapping, CanonicalColumn::Result)),
        bug_id: text(row, mapping, CanonicalColumn::BugId),
        priority: parse_priority(&text(row, mapping, CanonicalColumn::Priority)),
        severity: parse_severity(&text(row, mapping, CanonicalColumn::Severity)),
        duration: text(row, mapping, CanonicalColumn::Duration),
        tester: text(row, mapping, CanonicalColumn::Tester),
    }
}

/// Unrecognized and blank values become `Not Executed`.
pub fn parse_result(value: &str) -> TestResult {
    aliases::result_alias(value).unwrap_or(TestResult::NotExecuted)
}

/// Unrecognized and blank values leave the severity unclassified.
pub fn parse_severity(value: &str) -> Option<Severity> {
    aliases::severity_alias(value)
}

pub fn parse_priority(value: &str) -> Option<Priority> {
    aliases::priority_alias(value)
}

/// Coerce a run counter to a non-negative integer, defaulting to 1.
pub fn parse_run(value: Option<&RawValue>) -> u32 {
    const DEFAULT_RUN: u32 = 1;

    let as_whole = |n: f64| -> Option<u32> {
        (n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX))
            .then_some(n as u32)
    };

    match value {
        Some(RawValue::Number(n)) => as_whole(*n),
        Some(RawValue::Text(s)) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(as_whole))
        }
        _ => None,
    }
    .unwrap_or(DEFAULT_RUN)
}
