use serde_json::json;

use super::{NarrativeError, NarrativeRequest};
use crate::core::CanonicalColumn;

/// Rows included in an ingestion prompt.
const SAMPLE_ROWS: usize = 20;

const INGESTION_INSTRUCTIONS: &str = "You are a QA data engineer. Assess the normalized test execution \
dataset below. Canonical columns are Module, TestCaseID, Description, Run, Result, BugID, Priority, \
Severity, Duration, Tester. Defaults already applied: Run=1 when missing, Result='Not Executed' when \
blank. Respond with JSON only: {\"file_type\": string, \"canonical_columns\": [string], \
\"issues\": [string], \"readiness_note\": string}.";

const ANALYSIS_INSTRUCTIONS: &str = "You are a QA analytics expert. The metrics below were computed \
from the normalized dataset. Echo them and add likely_causes for the top failing modules, classifying \
each as Product (logic errors), Automation (script or data setup issues) or Environment \
(infrastructure or connectivity). Respond with JSON only: {\"summary\": {...}, \"fail_by_module\": {}, \
\"defects_by_severity\": {}, \"defects_by_priority\": {}, \"density\": {}, \"flaky\": [], \
\"key_bugs\": [], \"likely_causes\": {\"module\": \"Category - reason\"}}.";

const REPORT_INSTRUCTIONS: &str = "You are a senior QA lead writing a test summary report. Using the \
metrics, quality gate evaluation and metadata below, respond with JSON only: {\"introduction\": string, \
\"test_summary\": string, \"variances\": [string], \"defect_summary_matrix\": {\"critical\": n, \
\"major\": n, \"medium\": n, \"minor\": n}, \"key_findings\": {\"stable_areas\": [string], \
\"risky_areas\": [string]}, \"exit_criteria\": {\"met\": [string], \"not_met\": [string]}, \
\"recommendations\": [string], \"signoff\": {\"test_lead\": string, \"dev_lead\": string, \
\"product_owner\": string, \"qa_manager\": string}}. Keep it concise and factual.";

/// Render the instructions and JSON payload sent to an external agent.
pub fn build_prompt(request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
    let (instructions, payload) = match *request {
        NarrativeRequest::Ingestion { file_type, table } => {
            let sample: Vec<_> = table
                .iter()
                .take(SAMPLE_ROWS)
                .map(|record| {
                    CanonicalColumn::ALL
                        .iter()
                        .map(|c| (c.as_str().to_string(), json!(record.value(*c))))
                        .collect::<serde_json::Map<_, _>>()
                })
                .collect();
            (
                INGESTION_INSTRUCTIONS,
                json!({
                    "file_type": file_type,
                    "row_count": table.len(),
                    "columns": table.column_names(),
                    "sample_rows": sample,
                }),
            )
        }
        NarrativeRequest::Analysis { metrics } => (ANALYSIS_INSTRUCTIONS, json!({ "metrics": metrics })),
        NarrativeRequest::Report {
            metrics,
            recommendation,
            evaluation,
            metadata,
            sign_off,
        } => (
            REPORT_INSTRUCTIONS,
            json!({
                "metadata": metadata,
                "metrics": metrics,
                "recommendation": recommendation,
                "evaluation": evaluation,
                "sign_off": sign_off,
            }),
        ),
    };

    let payload = serde_json::to_string_pretty(&payload)
        .map_err(|e| NarrativeError::invalid("prompt", e.to_string()))?;
    Ok(format!(
        "task: {}\n\n{}\n\n{}\n",
        request.kind(),
        instructions,
        payload
    ))
}
