//! Typed shapes of the three narrative responses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{NarrativeError, NarrativeKind};
use crate::core::CanonicalColumn;
use crate::metrics::ExecutionSummary;

/// A response shape the pipeline accepts from a narrative generator.
pub trait NarrativeContract: Serialize + DeserializeOwned {
    const KIND: NarrativeKind;

    /// Semantic checks beyond the shape enforced by deserialization.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Minimal value used only if even the built-in generator fails.
    fn placeholder() -> Self;

    fn from_value(agent: &str, value: Value) -> Result<Self, NarrativeError> {
        let section: Self = serde_json::from_value(value).map_err(|e| {
            NarrativeError::invalid(agent, format!("{} response: {}", Self::KIND, e))
        })?;
        section
            .validate()
            .map_err(|e| NarrativeError::invalid(agent, format!("{} response: {}", Self::KIND, e)))?;
        Ok(section)
    }
}

/// Parse a text response as JSON. A surrounding Markdown code fence, with or
/// without a language tag, is stripped first.
pub fn parse_response(agent: &str, text: &str) -> Result<Value, NarrativeError> {
    let body = strip_code_fence(text.trim());
    serde_json::from_str(body).map_err(|e| NarrativeError::invalid(agent, format!("not valid JSON: {e}")))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.trim_end().strip_suffix("```") else {
        return text;
    };
    // Drop the language tag on the opening line
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim_start().starts_with(['{', '[']) => {
            inner[newline + 1..].trim()
        }
        _ => inner.trim(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionReadiness {
    pub file_type: String,
    pub canonical_columns: Vec<String>,
    pub issues: Vec<String>,
    pub readiness_note: String,
}

impl NarrativeContract for IngestionReadiness {
    const KIND: NarrativeKind = NarrativeKind::Ingestion;

    fn validate(&self) -> Result<(), String> {
        if self.readiness_note.trim().is_empty() {
            return Err("readiness_note is empty".into());
        }
        Ok(())
    }

    fn placeholder() -> Self {
        Self {
            file_type: "unknown".into(),
            canonical_columns: CanonicalColumn::ALL.iter().map(|c| c.to_string()).collect(),
            issues: Vec::new(),
            readiness_note: "Readiness could not be assessed".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisNarrative {
    pub summary: ExecutionSummary,
    pub fail_by_module: BTreeMap<String, usize>,
    pub defects_by_severity: BTreeMap<String, usize>,
    pub defects_by_priority: BTreeMap<String, usize>,
    /// Either plain counts or detailed density objects
    pub density: BTreeMap<String, Value>,
    pub flaky: Vec<String>,
    /// Bug ids or detailed bug objects
    pub key_bugs: Vec<Value>,
    #[serde(default)]
    pub likely_causes: BTreeMap<String, String>,
}

impl NarrativeContract for AnalysisNarrative {
    const KIND: NarrativeKind = NarrativeKind::Analysis;

    fn validate(&self) -> Result<(), String> {
        let s = &self.summary;
        if s.passed + s.failed + s.blocked > s.executed {
            return Err("summary counts exceed executed".into());
        }
        if !(0.0..=100.0).contains(&s.pass_pct) {
            return Err(format!("pass_pct {} out of range", s.pass_pct));
        }
        Ok(())
    }

    fn placeholder() -> Self {
        Self {
            summary: ExecutionSummary::default(),
            fail_by_module: BTreeMap::new(),
            defects_by_severity: BTreeMap::new(),
            defects_by_priority: BTreeMap::new(),
            density: BTreeMap::new(),
            flaky: Vec::new(),
            key_bugs: Vec::new(),
            likely_causes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyFindings {
    #[serde(default)]
    pub stable_areas: Vec<String>,
    #[serde(default)]
    pub risky_areas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitCriteria {
    #[serde(default)]
    pub met: Vec<String>,
    #[serde(default)]
    pub not_met: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportNarrative {
    pub introduction: String,
    pub test_summary: String,
    #[serde(default)]
    pub variances: Vec<String>,
    pub defect_summary_matrix: BTreeMap<String, usize>,
    pub key_findings: KeyFindings,
    pub exit_criteria: ExitCriteria,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub signoff: BTreeMap<String, String>,
}

impl NarrativeContract for ReportNarrative {
    const KIND: NarrativeKind = NarrativeKind::Report;

    fn validate(&self) -> Result<(), String> {
        if self.introduction.trim().is_empty() {
            return Err("introduction is empty".into());
        }
        if self.test_summary.trim().is_empty() {
            return Err("test_summary is empty".into());
        }
        Ok(())
    }

    fn placeholder() -> Self {
        Self {
            introduction: "Test execution summary.".into(),
            test_summary: "See metrics below.".into(),
            variances: Vec::new(),
            defect_summary_matrix: BTreeMap::new(),
            key_findings: KeyFindings::default(),
            exit_criteria: ExitCriteria::default(),
            recommendations: Vec::new(),
            signoff: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use serde_json::json;

    #[test]
    fn test_fenced_json_is_accepted() {
        let text = indoc! {r#"
            ```json
            {"file_type": "csv", "canonical_columns": [], "issues": [], "readiness_note": "ok"}
            ```
        "#};
        let value = parse_response("agent", text).unwrap();
        assert_eq!(value["file_type"], "csv");

        let bare_fence = "```\n{\"a\": 1}\n```";
        assert_eq!(parse_response("agent", bare_fence).unwrap(), json!({"a": 1}));

        let inline_fence = "```{\"a\": 2}```";
        assert_eq!(parse_response("agent", inline_fence).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn test_malformed_json_is_invalid_response() {
        let err = parse_response("agent", "Sure! Here is your report").unwrap_err();
        assert!(matches!(err, NarrativeError::InvalidResponse { .. }));
    }

    #[test]
    fn test_missing_required_key_is_rejected() {
        let err = IngestionReadiness::from_value(
            "agent",
            json!({"file_type": "csv", "canonical_columns": [], "issues": []}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("readiness_note"));
    }

    #[test]
    fn test_analysis_accepts_plain_count_density_and_string_bugs() {
        let analysis = AnalysisNarrative::from_value(
            "agent",
            json!({
                "summary": {"total": 3, "executed": 3, "passed": 2, "failed": 1,
                            "blocked": 0, "skipped": 0, "pass_pct": 66.67},
                "fail_by_module": {"Login": 1},
                "defects_by_severity": {"Critical": 0},
                "defects_by_priority": {"High": 1},
                "density": {"Login": 1},
                "flaky": ["TC1"],
                "key_bugs": ["BUG-1"]
            }),
        )
        .unwrap();
        assert!(analysis.likely_causes.is_empty());
        assert_eq!(analysis.key_bugs, vec![json!("BUG-1")]);
    }

    #[test]
    fn test_inconsistent_summary_is_rejected() {
        let err = AnalysisNarrative::from_value(
            "agent",
            json!({
                "summary": {"total": 1, "executed": 1, "passed": 2, "failed": 0,
                            "blocked": 0, "skipped": 0, "pass_pct": 100.0},
                "fail_by_module": {}, "defects_by_severity": {}, "defects_by_priority": {},
                "density": {}, "flaky": [], "key_bugs": []
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceed"));
    }
}
