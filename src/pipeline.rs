//! One report generation: read, normalize, measure, gate, narrate, assemble.
//!
//! Everything after reading is infallible. Narrative failures are recorded as
//! report warnings and never abort a run.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

use crate::config::ReportConfig;
use crate::core::{CanonicalTable, Error, RawRecordSet, Result};
use crate::io::{self, OutputFormat};
use crate::metrics::{self, MetricsBundle};
use crate::narrative::{generate_with_fallback, NarrativeGenerator, NarrativeRequest, Narratives};
use crate::normalize::normalize;
use crate::observability::{set_current_input, set_phase, PipelinePhase};
use crate::quality_gate::QualityGateEvaluator;
use crate::report::{file_type_of, ReportContext, ReportMetadata, ReportParts};

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub input: PathBuf,
    pub metadata: ReportMetadata,
    /// Requested gate id. When absent the config override, then `default`, applies.
    pub quality_gate: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: CanonicalTable,
    pub metrics: MetricsBundle,
    pub report: ReportContext,
}

/// Paths written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub markdown: PathBuf,
    pub json: PathBuf,
    pub metrics: PathBuf,
}

/// Run the full pipeline over one input file.
pub fn run_pipeline(
    request: &PipelineRequest,
    config: &ReportConfig,
    narrator: &dyn NarrativeGenerator,
) -> Result<PipelineOutput> {
    let _input = set_current_input(&request.input);
    let span = info_span!("pipeline", input = %request.input.display());
    let _enter = span.enter();

    let raw = {
        let _phase = set_phase(PipelinePhase::Reading);
        let _span = info_span!("reading").entered();
        io::read_records(&request.input)?
    };

    let mut metadata = request.metadata.clone();
    if metadata.source_file.is_empty() {
        metadata.source_file = request.input.display().to_string();
    }

    Ok(build_report(
        &raw,
        &file_type_of(&request.input),
        metadata,
        request.quality_gate.as_deref(),
        config,
        narrator,
        Local::now(),
    ))
}

/// Build a report from records already in memory.
pub fn build_report(
    raw: &RawRecordSet,
    file_type: &str,
    metadata: ReportMetadata,
    quality_gate: Option<&str>,
    config: &ReportConfig,
    narrator: &dyn NarrativeGenerator,
    now: DateTime<Local>,
) -> PipelineOutput {
    let table = {
        let _phase = set_phase(PipelinePhase::Normalizing);
        let _span = info_span!("normalizing", rows = raw.len()).entered();
        normalize(raw)
    };

    let metrics = {
        let _phase = set_phase(PipelinePhase::ComputingMetrics);
        let _span = info_span!("computing_metrics").entered();
        metrics::compute(&table)
    };

    let gate = config.effective_gate(quality_gate);
    let evaluator = QualityGateEvaluator::new(config);
    let (recommendation, evaluation, recommendation_text) = {
        let _phase = set_phase(PipelinePhase::EvaluatingGate);
        let _span = info_span!("evaluating_gate", gate).entered();
        let (recommendation, evaluation) = evaluator.evaluate(
            metrics.summary.pass_pct,
            metrics.critical_defects(),
            metrics.major_defects(),
            gate,
        );
        let text = evaluator.recommendation_text(gate, recommendation);
        (recommendation, evaluation, text)
    };

    let mut warnings = Vec::new();
    let narrative = {
        let _phase = set_phase(PipelinePhase::Narrative);
        let _span = info_span!("narrative", agent = narrator.name()).entered();
        let readiness = generate_with_fallback(
            narrator,
            &NarrativeRequest::Ingestion {
                file_type,
                table: &table,
            },
            &mut warnings,
        );
        let analysis = generate_with_fallback(
            narrator,
            &NarrativeRequest::Analysis { metrics: &metrics },
            &mut warnings,
        );
        let report = generate_with_fallback(
            narrator,
            &NarrativeRequest::Report {
                metrics: &metrics,
                recommendation,
                evaluation: &evaluation,
                metadata: &metadata,
                sign_off: &config.sign_off,
            },
            &mut warnings,
        );
        Narratives {
            readiness,
            analysis,
            report,
        }
    };

    let report = ReportContext::assemble(
        ReportParts {
            metadata,
            metrics: metrics.clone(),
            recommendation,
            recommendation_text,
            evaluation,
            narrative,
            sign_off: config.sign_off.clone(),
            test_environment: config.test_environment.clone(),
            warnings,
        },
        now,
    );
    info!(
        "Report {} assembled: {} ({} warnings)",
        report.report_id,
        report.recommendation,
        report.warnings.len()
    );

    PipelineOutput {
        table,
        metrics,
        report,
    }
}

/// Write `<base>.md`, `<base>.json` and `<base>_metrics.json` into `outdir`.
pub fn write_artifacts(output: &PipelineOutput, outdir: &Path) -> Result<ArtifactPaths> {
    let _phase = set_phase(PipelinePhase::Rendering);
    let _span = info_span!("rendering", outdir = %outdir.display()).entered();

    io::ensure_dir(outdir)?;
    let base = output.report.metadata.base_name();
    let paths = ArtifactPaths {
        markdown: outdir.join(format!("{base}.{}", OutputFormat::Markdown.extension())),
        json: outdir.join(format!("{base}.{}", OutputFormat::Json.extension())),
        metrics: outdir.join(format!("{base}_metrics.json")),
    };

    let markdown = io::render_to_string(OutputFormat::Markdown, &output.report)
        .map_err(|e| Error::WithContext {
            context: "Failed to render report".to_string(),
            message: e.to_string(),
        })?;
    io::write_file(&paths.markdown, &markdown)?;
    io::write_json(&paths.json, &output.report)?;
    io::write_json(&paths.metrics, &output.metrics)?;

    info!("Wrote report artifacts to {}", outdir.display());
    Ok(paths)
}
