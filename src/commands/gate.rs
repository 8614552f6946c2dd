use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::path::PathBuf;

use super::load_report_config;
use crate::config::format_threshold;
use crate::io::OutputFormat;
use crate::quality_gate::{GateEvaluation, QualityGateEvaluator, Recommendation};

pub struct GateCommandConfig {
    pub pass_rate: f64,
    pub critical: usize,
    pub major: usize,
    pub quality_gate: Option<String>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct GateOutput<'a> {
    recommendation: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation_text: Option<&'a str>,
    evaluation: &'a GateEvaluation,
}

/// Render an evaluation for the `gate` command.
pub fn render_gate(
    format: OutputFormat,
    recommendation: Recommendation,
    evaluation: &GateEvaluation,
    text: Option<&str>,
) -> Result<String> {
    if format == OutputFormat::Json {
        let output = GateOutput {
            recommendation,
            recommendation_text: text,
            evaluation,
        };
        return Ok(serde_json::to_string_pretty(&output)?);
    }

    let label = match recommendation {
        Recommendation::Approved => recommendation.as_str().green().bold(),
        Recommendation::Conditional => recommendation.as_str().yellow().bold(),
        Recommendation::Rejected => recommendation.as_str().red().bold(),
    };
    let approved = &evaluation.release_thresholds.approved;
    let conditional = &evaluation.release_thresholds.conditional;
    let mut out = format!(
        "{} ({} / {})\n{}\n",
        label, evaluation.gate_name, evaluation.quality_gate_used, evaluation.reason
    );
    out.push_str(&format!(
        "approved: >= {}% pass, <= {} critical, <= {} major\n",
        format_threshold(approved.min_pass_rate),
        format_threshold(approved.max_critical_defects),
        format_threshold(approved.max_major_defects)
    ));
    out.push_str(&format!(
        "conditional: >= {}% pass, <= {} critical, <= {} major\n",
        format_threshold(conditional.min_pass_rate),
        format_threshold(conditional.max_critical_defects),
        format_threshold(conditional.max_major_defects)
    ));
    if let Some(text) = text {
        out.push_str(text);
        out.push('\n');
    }
    Ok(out)
}

pub fn handle_gate(config: GateCommandConfig) -> Result<Recommendation> {
    let report_config = load_report_config(config.config.as_deref())?;
    let gate = report_config.effective_gate(config.quality_gate.as_deref());
    let evaluator = QualityGateEvaluator::new(&report_config);

    let (recommendation, evaluation) =
        evaluator.evaluate(config.pass_rate, config.critical, config.major, gate);
    let text = evaluator.recommendation_text(gate, recommendation);

    print!(
        "{}",
        render_gate(config.format, recommendation, &evaluation, text.as_deref())?
    );
    if config.format == OutputFormat::Json {
        println!();
    }
    Ok(recommendation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;

    fn evaluate(pass_rate: f64, critical: usize, major: usize) -> (Recommendation, GateEvaluation) {
        let config = ReportConfig::default();
        QualityGateEvaluator::new(&config).evaluate(pass_rate, critical, major, "default")
    }

    #[test]
    fn test_render_text() {
        colored::control::set_override(false);
        let (rec, evaluation) = evaluate(97.0, 0, 1);
        let text = render_gate(OutputFormat::Terminal, rec, &evaluation, Some("Ship it")).unwrap();
        assert!(text.starts_with("APPROVED (Default Quality Gate / default)"));
        assert!(text.contains("approved: >= 95% pass, <= 0 critical, <= 2 major"));
        assert!(text.ends_with("Ship it\n"));
    }

    #[test]
    fn test_render_json() {
        let (rec, evaluation) = evaluate(50.0, 1, 0);
        let json = render_gate(OutputFormat::Json, rec, &evaluation, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["recommendation"], "REJECTED");
        assert_eq!(value["evaluation"]["criteria_met"], false);
        assert!(value.get("recommendation_text").is_none());
    }
}
