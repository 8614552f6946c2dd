use anyhow::{Context, Result};
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use super::{load_report_config, select_narrator};
use crate::config::validate_config;
use crate::io::{create_writer, OutputFormat};
use crate::pipeline::{run_pipeline, write_artifacts, PipelineRequest};
use crate::quality_gate::Recommendation;
use crate::report::ReportMetadata;

pub struct GenerateConfig {
    pub file: PathBuf,
    pub metadata: ReportMetadata,
    pub outdir: PathBuf,
    pub format: OutputFormat,
    pub quality_gate: Option<String>,
    pub config: Option<PathBuf>,
    pub narrator: Option<String>,
    pub narrator_timeout: Duration,
    pub skip_narrative: bool,
}

/// Generate, persist and print one report. Returns the recommendation so the
/// caller can decide on an exit status.
pub fn handle_generate(config: GenerateConfig) -> Result<Recommendation> {
    let report_config = load_report_config(config.config.as_deref())?;
    for problem in validate_config(&report_config) {
        tracing::warn!("Configuration problem: {}", problem);
    }

    let narrator = select_narrator(
        config.narrator.as_deref(),
        config.skip_narrative,
        config.narrator_timeout,
    );
    let request = PipelineRequest {
        input: config.file.clone(),
        metadata: config.metadata,
        quality_gate: config.quality_gate,
    };

    let output = run_pipeline(&request, &report_config, narrator.as_ref())
        .with_context(|| format!("Failed to generate report for {}", config.file.display()))?;
    let paths = write_artifacts(&output, &config.outdir).context("Failed to write report")?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    create_writer(config.format, Box::new(&mut handle)).write_report(&output.report)?;
    handle.flush()?;

    eprintln!(
        "{} {}",
        "Report written:".green(),
        paths.markdown.display()
    );
    eprintln!("  {}", paths.json.display());
    eprintln!("  {}", paths.metrics.display());

    Ok(output.report.recommendation)
}
