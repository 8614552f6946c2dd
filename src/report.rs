//! The assembled report handed to output writers.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{SignOffConfig, TestEnvironmentConfig};
use crate::metrics::{
    ExecutionSummary, KeyBug, MetricsBundle, ModuleCoverage, ModuleDensity, PriorityHistogram,
    SeverityHistogram,
};
use crate::narrative::Narratives;
use crate::quality_gate::{GateEvaluation, Recommendation};

/// Caller-supplied descriptive fields of a report run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub project: String,
    pub release: String,
    pub environment: String,
    pub scope: String,
    pub objectives: String,
    pub linked_plan: String,
    /// Input file the records were read from
    #[serde(default)]
    pub source_file: String,
}

impl ReportMetadata {
    /// Base file name shared by every artifact of a run.
    pub fn base_name(&self) -> String {
        format!(
            "TSR_{}_{}",
            sanitize_component(&self.project),
            sanitize_component(&self.release)
        )
    }
}

/// Unique identifier of one report generation.
pub fn report_id(metadata: &ReportMetadata, at: DateTime<Local>) -> String {
    format!("{}_{}", metadata.base_name(), at.format("%Y%m%d_%H%M%S"))
}

/// Keep file names portable: path separators and whitespace become `_`.
fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// File type label derived from an input path's extension.
pub fn file_type_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub metadata: ReportMetadata,
    pub summary: ExecutionSummary,
    pub module_coverage: BTreeMap<String, ModuleCoverage>,
    pub fail_by_module: BTreeMap<String, usize>,
    pub defects_by_severity: SeverityHistogram,
    pub defects_by_priority: PriorityHistogram,
    pub density: BTreeMap<String, ModuleDensity>,
    pub key_bugs: Vec<KeyBug>,
    pub flaky_tests: Vec<String>,
    pub severity_from_priority: bool,
    pub recommendation: Recommendation,
    /// Profile text describing the recommendation, when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_text: Option<String>,
    pub evaluation: GateEvaluation,
    pub narrative: Narratives,
    pub sign_off: SignOffConfig,
    pub sign_off_date: String,
    pub test_environment: TestEnvironmentConfig,
    /// Recoverable problems encountered while building the report
    #[serde(default)]
    pub warnings: Vec<String>,
}

pub struct ReportParts {
    pub metadata: ReportMetadata,
    pub metrics: MetricsBundle,
    pub recommendation: Recommendation,
    pub recommendation_text: Option<String>,
    pub evaluation: GateEvaluation,
    pub narrative: Narratives,
    pub sign_off: SignOffConfig,
    pub test_environment: TestEnvironmentConfig,
    pub warnings: Vec<String>,
}

impl ReportContext {
    pub fn assemble(parts: ReportParts, now: DateTime<Local>) -> Self {
        let ReportParts {
            metadata,
            metrics,
            recommendation,
            recommendation_text,
            evaluation,
            narrative,
            sign_off,
            test_environment,
            warnings,
        } = parts;

        let today: NaiveDate = now.date_naive();
        Self {
            report_id: report_id(&metadata, now),
            generated_at: now.with_timezone(&Utc),
            sign_off_date: sign_off.formatted_date(today),
            metadata,
            summary: metrics.summary,
            module_coverage: metrics.module_coverage,
            fail_by_module: metrics.fail_by_module,
            defects_by_severity: metrics.defects_by_severity,
            defects_by_priority: metrics.defects_by_priority,
            density: metrics.density,
            key_bugs: metrics.key_bugs,
            flaky_tests: metrics.flaky,
            severity_from_priority: metrics.severity_from_priority,
            recommendation,
            recommendation_text,
            evaluation,
            narrative,
            sign_off,
            test_environment,
            warnings,
        }
    }
}
