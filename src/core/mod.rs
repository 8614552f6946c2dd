pub mod errors;

pub use errors::{Error, Result, ResultExt};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integers beyond this magnitude are not exactly representable as `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single untrusted cell value as delivered by a reader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl RawValue {
    /// Render the value as trimmed text. Integral numbers lose their
    /// fractional part so `2.0` reads as `"2"`.
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Text(s) => s.trim().to_string(),
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                format!("{}", *n as i64)
            }
            RawValue::Number(n) if n.is_nan() => String::new(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Empty => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_empty()
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

/// One input row: column labels in the order the reader saw them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, label: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<RawValue>) {
        self.cells.push((label.into(), value.into()));
    }

    pub fn get(&self, label: &str) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (label, value) in iter {
            row.push(label, value);
        }
        row
    }
}

/// The raw tabular record set handed over by a reader.
///
/// `columns` is the union of all labels in first-seen order, so a set read
/// from a header-only CSV still knows its columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRecordSet {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawRecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let mut set = Self::default();
        for row in rows {
            set.push_row(row);
        }
        set
    }

    pub fn push_row(&mut self, row: RawRow) {
        for (label, _) in row.iter() {
            if !self.columns.iter().any(|c| c == label) {
                self.columns.push(label.to_string());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The ten columns every canonical record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalColumn {
    Module,
    TestCaseId,
    Description,
    Run,
    Result,
    BugId,
    Priority,
    Severity,
    Duration,
    Tester,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 10] = [
        CanonicalColumn::Module,
        CanonicalColumn::TestCaseId,
        CanonicalColumn::Description,
        CanonicalColumn::Run,
        CanonicalColumn::Result,
        CanonicalColumn::BugId,
        CanonicalColumn::Priority,
        CanonicalColumn::Severity,
        CanonicalColumn::Duration,
        CanonicalColumn::Tester,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalColumn::Module => "Module",
            CanonicalColumn::TestCaseId => "TestCaseID",
            CanonicalColumn::Description => "Description",
            CanonicalColumn::Run => "Run",
            CanonicalColumn::Result => "Result",
            CanonicalColumn::BugId => "BugID",
            CanonicalColumn::Priority => "Priority",
            CanonicalColumn::Severity => "Severity",
            CanonicalColumn::Duration => "Duration",
            CanonicalColumn::Tester => "Tester",
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestResult {
    Pass,
    Fail,
    Blocked,
    Skipped,
    #[default]
    #[serde(rename = "Not Executed")]
    NotExecuted,
}

impl TestResult {
    pub fn as_str(self) -> &'static str {
        match self {
            TestResult::Pass => "Pass",
            TestResult::Fail => "Fail",
            TestResult::Blocked => "Blocked",
            TestResult::Skipped => "Skipped",
            TestResult::NotExecuted => "Not Executed",
        }
    }

    /// Pass, Fail and Blocked count as executed.
    pub fn is_executed(self) -> bool {
        matches!(self, TestResult::Pass | TestResult::Fail | TestResult::Blocked)
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Major,
    Medium,
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Major,
        Severity::Medium,
        Severity::Minor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Major => "Major",
            Severity::Medium => "Medium",
            Severity::Minor => "Minor",
        }
    }

    /// Severity implied by a priority when a dataset carries no severities.
    pub fn from_priority(priority: Priority) -> Self {
        match priority {
            Priority::Highest => Severity::Critical,
            Priority::High => Severity::Major,
            Priority::Medium => Severity::Medium,
            Priority::Low => Severity::Minor,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Highest,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Highest,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Highest => "Highest",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown priority '{}'", s))
    }
}

/// Serializes `None` as the empty string so canonical rows always carry
/// every key with a string value.
pub(crate) mod blank_option {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(
        value: &Option<T>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T: FromStr, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<T>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok()))
    }
}

/// One test case execution in the canonical schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Module")]
    pub module: String,
    #[serde(rename = "TestCaseID")]
    pub test_case_id: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Run")]
    pub run: u32,
    #[serde(rename = "Result")]
    pub result: TestResult,
    #[serde(rename = "BugID")]
    pub bug_id: String,
    #[serde(rename = "Priority", with = "blank_option")]
    pub priority: Option<Priority>,
    #[serde(rename = "Severity", with = "blank_option")]
    pub severity: Option<Severity>,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Tester")]
    pub tester: String,
}

impl Default for CanonicalRecord {
    fn default() -> Self {
        Self {
            module: String::new(),
            test_case_id: String::new(),
            description: String::new(),
            run: 1,
            result: TestResult::NotExecuted,
            bug_id: String::new(),
            priority: None,
            severity: None,
            duration: String::new(),
            tester: String::new(),
        }
    }
}

impl CanonicalRecord {
    pub fn new(module: &str, test_case_id: &str, result: TestResult) -> Self {
        Self {
            module: module.to_string(),
            test_case_id: test_case_id.to_string(),
            result,
            ..Self::default()
        }
    }

    pub fn has_bug(&self) -> bool {
        !self.bug_id.is_empty()
    }

    /// Text value of one canonical column, as it would appear in a report.
    pub fn value(&self, column: CanonicalColumn) -> String {
        match column {
            CanonicalColumn::Module => self.module.clone(),
            CanonicalColumn::TestCaseId => self.test_case_id.clone(),
            CanonicalColumn::Description => self.description.clone(),
            CanonicalColumn::Run => self.run.to_string(),
            CanonicalColumn::Result => self.result.as_str().to_string(),
            CanonicalColumn::BugId => self.bug_id.clone(),
            CanonicalColumn::Priority => self.priority.map(|p| p.to_string()).unwrap_or_default(),
            CanonicalColumn::Severity => self.severity.map(|s| s.to_string()).unwrap_or_default(),
            CanonicalColumn::Duration => self.duration.clone(),
            CanonicalColumn::Tester => self.tester.clone(),
        }
    }

    pub fn to_raw_row(&self) -> RawRow {
        CanonicalColumn::ALL
            .into_iter()
            .map(|column| {
                let value = match column {
                    CanonicalColumn::Run => RawValue::Number(f64::from(self.run)),
                    other => RawValue::Text(self.value(other)),
                };
                (column.as_str(), value)
            })
            .collect()
    }
}

/// Output of the normalizer: canonical rows that always expose all ten
/// canonical columns, even when there are no rows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalTable {
    records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn columns(&self) -> &'static [CanonicalColumn] {
        &CanonicalColumn::ALL
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        CanonicalColumn::ALL.iter().map(|c| c.as_str()).collect()
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-blank module names, sorted.
    pub fn modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .records
            .iter()
            .filter(|r| !r.module.is_empty())
            .map(|r| r.module.clone())
            .collect();
        modules.sort();
        modules.dedup();
        modules
    }

    /// Round-trip back into a raw record set using canonical labels.
    pub fn to_raw(&self) -> RawRecordSet {
        let mut raw = RawRecordSet::new(self.column_names().into_iter().map(String::from).collect());
        for record in &self.records {
            raw.push_row(record.to_raw_row());
        }
        raw
    }
}

impl<'a> IntoIterator for &'a CanonicalTable {
    type Item = &'a CanonicalRecord;
    type IntoIter = std::slice::Iter<'a, CanonicalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_as_text_trims_and_drops_integral_fraction() {
        assert_eq!(RawValue::from("  Login ").as_text(), "Login");
        assert_eq!(RawValue::from(2.0).as_text(), "2");
        assert_eq!(RawValue::from(2.5).as_text(), "2.5");
        assert_eq!(RawValue::Number(f64::NAN).as_text(), "");
        assert_eq!(RawValue::Empty.as_text(), "");
        assert!(RawValue::from("   ").is_blank());
    }

    #[test]
    fn test_raw_value_as_text_keeps_huge_integers() {
        assert_eq!(RawValue::from(1e20).as_text(), "100000000000000000000");
        assert_eq!(RawValue::from(-1e20).as_text(), "-100000000000000000000");
        assert_eq!(RawValue::from(9_007_199_254_740_991.0).as_text(), "9007199254740991");
    }

    #[test]
    fn test_record_set_tracks_column_union_in_first_seen_order() {
        let set = RawRecordSet::from_rows(vec![
            RawRow::new().with("status", "pass").with("tcid", "TC1"),
            RawRow::new().with("tcid", "TC2").with("Module", "Login"),
        ]);
        assert_eq!(set.columns(), &["status", "tcid", "Module"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_canonical_record_serializes_blank_enums_as_empty_strings() {
        let record = CanonicalRecord::new("Login", "TC1", TestResult::NotExecuted);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Severity"], "");
        assert_eq!(json["Priority"], "");
        assert_eq!(json["Result"], "Not Executed");
        assert_eq!(json["Run"], 1);
        assert_eq!(json["TestCaseID"], "TC1");
    }

    #[test]
    fn test_canonical_record_deserializes_back() {
        let record = CanonicalRecord {
            severity: Some(Severity::Major),
            priority: Some(Priority::High),
            bug_id: "BUG-7".into(),
            ..CanonicalRecord::new("Cart", "TC9", TestResult::Fail)
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CanonicalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_empty_table_still_exposes_columns() {
        let table = CanonicalTable::default();
        assert!(table.is_empty());
        assert_eq!(table.column_names().len(), 10);
        assert_eq!(table.to_raw().columns().len(), 10);
    }

    #[test]
    fn test_severity_from_priority() {
        assert_eq!(Severity::from_priority(Priority::Highest), Severity::Critical);
        assert_eq!(Severity::from_priority(Priority::High), Severity::Major);
        assert_eq!(Severity::from_priority(Priority::Medium), Severity::Medium);
        assert_eq!(Severity::from_priority(Priority::Low), Severity::Minor);
    }
}
