use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::contract::{AnalysisNarrative, ExitCriteria, IngestionReadiness, KeyFindings, ReportNarrative};
use super::{NarrativeError, NarrativeGenerator, NarrativeRequest};
use crate::config::{format_threshold, SignOffConfig};
use crate::core::{CanonicalRecord, CanonicalTable, Severity, TestResult};
use crate::metrics::{MetricsBundle, RiskLevel};
use crate::quality_gate::{GateEvaluation, Recommendation};
use crate::report::ReportMetadata;

/// Deterministic narrator built from the real metrics. Used when no agent is
/// configured and as the fallback for every agent failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubNarrator;

impl NarrativeGenerator for StubNarrator {
    fn name(&self) -> &str {
        "builtin"
    }

    fn generate(&self, request: &NarrativeRequest<'_>) -> Result<Value, NarrativeError> {
        let value = match *request {
            NarrativeRequest::Ingestion { file_type, table } => {
                serde_json::to_value(readiness(file_type, table))
            }
            NarrativeRequest::Analysis { metrics } => serde_json::to_value(analysis(metrics)),
            NarrativeRequest::Report {
                metrics,
                recommendation,
                evaluation,
                metadata,
                sign_off,
            } => serde_json::to_value(report(metrics, recommendation, evaluation, metadata, sign_off)),
        };
        value.map_err(|e| NarrativeError::invalid(self.name(), e.to_string()))
    }
}

fn readiness(file_type: &str, table: &CanonicalTable) -> IngestionReadiness {
    let records = table.records();
    let count = |pred: fn(&CanonicalRecord) -> bool| records.iter().filter(|r| pred(r)).count();

    let mut issues = Vec::new();
    let not_executed = count(|r| r.result == TestResult::NotExecuted);
    if not_executed > 0 {
        issues.push(format!("{not_executed} rows have no recognized result and were treated as Not Executed"));
    }
    let no_module = count(|r| r.module.is_empty());
    if no_module > 0 {
        issues.push(format!("{no_module} rows have no module"));
    }
    let no_id = count(|r| r.test_case_id.is_empty());
    if no_id > 0 {
        issues.push(format!("{no_id} rows have no test case id"));
    }
    let bug_rows = count(|r| r.has_bug());
    if bug_rows > 0 && !records.iter().any(|r| r.severity.is_some()) {
        issues.push("No severity values present; severity will be derived from priority where possible".into());
    }

    let readiness_note = if table.is_empty() {
        "Dataset is empty; the report will contain zero counts".to_string()
    } else if issues.is_empty() {
        format!("Dataset of {} rows is ready for analysis", table.len())
    } else {
        format!(
            "Dataset of {} rows is ready for analysis with {} normalization notes",
            table.len(),
            issues.len()
        )
    };

    IngestionReadiness {
        file_type: file_type.to_string(),
        canonical_columns: table.column_names().iter().map(|c| c.to_string()).collect(),
        issues,
        readiness_note,
    }
}

fn analysis(metrics: &MetricsBundle) -> AnalysisNarrative {
    let likely_causes = top_failing_modules(metrics, 3)
        .into_iter()
        .map(|(module, failures)| {
            let cause = match metrics.density.get(&module) {
                Some(d) if d.total > 0 => {
                    format!("Product - {} failures linked to {} logged defects", failures, d.total)
                }
                _ if !metrics.flaky.is_empty() => {
                    "Automation - failures without logged defects alongside intermittent results".to_string()
                }
                _ => "Environment - failures without logged defects".to_string(),
            };
            (module, cause)
        })
        .collect();

    AnalysisNarrative {
        summary: metrics.summary.clone(),
        fail_by_module: metrics.fail_by_module.clone(),
        defects_by_severity: metrics
            .defects_by_severity
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        defects_by_priority: metrics
            .defects_by_priority
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        density: metrics
            .density
            .iter()
            .map(|(module, d)| (module.clone(), json!(d.total)))
            .collect(),
        flaky: metrics.flaky.clone(),
        key_bugs: metrics.key_bugs.iter().map(|b| json!(b.id)).collect(),
        likely_causes,
    }
}

/// Modules by descending failure count, ties broken by name.
fn top_failing_modules(metrics: &MetricsBundle, limit: usize) -> Vec<(String, usize)> {
    let mut modules: Vec<(String, usize)> = metrics
        .fail_by_module
        .iter()
        .filter(|(module, _)| !module.is_empty())
        .map(|(m, c)| (m.clone(), *c))
        .collect();
    modules.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    modules.truncate(limit);
    modules
}

fn report(
    metrics: &MetricsBundle,
    recommendation: Recommendation,
    evaluation: &GateEvaluation,
    metadata: &ReportMetadata,
    sign_off: &SignOffConfig,
) -> ReportNarrative {
    let s = &metrics.summary;

    let introduction = format!(
        "This report summarizes test execution for {} release {} in the {} environment. Scope: {}. Objectives: {}.",
        metadata.project, metadata.release, metadata.environment, metadata.scope, metadata.objectives
    );
    let test_summary = format!(
        "{} of {} tests executed with a {:.1}% pass rate ({} passed, {} failed, {} blocked). Release recommendation: {}.",
        s.executed, s.total, s.pass_pct, s.passed, s.failed, s.blocked, recommendation
    );

    let mut variances = Vec::new();
    let not_run = s.total - s.executed;
    if not_run > 0 {
        variances.push(format!("{not_run} tests were not executed ({} skipped)", s.skipped));
    }
    if s.blocked > 0 {
        variances.push(format!("{} tests were blocked", s.blocked));
    }
    if variances.is_empty() {
        variances.push("No deviations from planned execution".into());
    }

    let defect_summary_matrix: BTreeMap<String, usize> = Severity::ALL
        .into_iter()
        .map(|sev| (sev.as_str().to_lowercase(), metrics.severity_count(sev)))
        .collect();

    ReportNarrative {
        introduction,
        test_summary,
        variances,
        defect_summary_matrix,
        key_findings: key_findings(metrics),
        exit_criteria: exit_criteria(evaluation),
        recommendations: recommendations(metrics, recommendation),
        signoff: [
            ("test_lead", &sign_off.test_lead),
            ("dev_lead", &sign_off.dev_lead),
            ("product_owner", &sign_off.product_owner),
            ("qa_manager", &sign_off.qa_manager),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect(),
    }
}

fn key_findings(metrics: &MetricsBundle) -> KeyFindings {
    let mut findings = KeyFindings::default();
    for (module, coverage) in &metrics.module_coverage {
        let risk = metrics.density.get(module).map(|d| d.risk_level);
        if coverage.failed == 0 && risk != Some(RiskLevel::High) {
            findings.stable_areas.push(module.clone());
        } else {
            findings.risky_areas.push(module.clone());
        }
    }
    findings
}

fn exit_criteria(evaluation: &GateEvaluation) -> ExitCriteria {
    let tier = &evaluation.release_thresholds.approved;
    let checks = [
        (
            evaluation.pass_rate >= tier.min_pass_rate,
            format!("Pass rate >= {}%", format_threshold(tier.min_pass_rate)),
        ),
        (
            evaluation.critical_defects as f64 <= tier.max_critical_defects,
            format!("Critical defects <= {}", format_threshold(tier.max_critical_defects)),
        ),
        (
            evaluation.major_defects as f64 <= tier.max_major_defects,
            format!("Major defects <= {}", format_threshold(tier.max_major_defects)),
        ),
    ];

    let mut criteria = ExitCriteria::default();
    for (passed, text) in checks {
        if passed {
            criteria.met.push(text);
        } else {
            criteria.not_met.push(text);
        }
    }
    criteria
}

fn recommendations(metrics: &MetricsBundle, recommendation: Recommendation) -> Vec<String> {
    let mut out = Vec::new();
    let critical = metrics.critical_defects();
    let major = metrics.major_defects();
    if critical > 0 {
        out.push(format!("Resolve the {critical} critical defect rows before release"));
    }
    if major > 0 {
        out.push(format!("Triage the {major} major defect rows and agree fix targets"));
    }
    for (module, _) in top_failing_modules(metrics, 3) {
        out.push(format!("Investigate failures in the {module} module"));
    }
    if !metrics.flaky.is_empty() {
        out.push(format!(
            "Stabilize flaky tests: {}",
            metrics.flaky.join(", ")
        ));
    }
    let not_run = metrics.summary.total - metrics.summary.executed;
    if not_run > 0 {
        out.push(format!("Execute the {not_run} outstanding tests"));
    }
    if out.is_empty() && recommendation == Recommendation::Approved {
        out.push("Proceed with release and continue monitoring in production".into());
    }
    out
}
