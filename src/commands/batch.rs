use anyhow::Result;
use colored::*;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::{load_report_config, select_narrator};
use crate::config::ReportConfig;
use crate::narrative::NarrativeGenerator;
use crate::observability::{increment_processed, set_progress};
use crate::pipeline::{run_pipeline, write_artifacts, ArtifactPaths, PipelineRequest};
use crate::quality_gate::Recommendation;
use crate::report::ReportMetadata;

pub struct BatchConfig {
    pub files: Vec<PathBuf>,
    pub outdir: PathBuf,
    pub project: Option<String>,
    pub release: String,
    pub quality_gate: Option<String>,
    pub config: Option<PathBuf>,
    pub narrator: Option<String>,
    pub narrator_timeout: Duration,
    pub skip_narrative: bool,
}

/// Result of one input in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub result: std::result::Result<(Recommendation, f64, ArtifactPaths), String>,
}

impl BatchOutcome {
    pub fn line(&self) -> String {
        match &self.result {
            Ok((recommendation, pass_pct, paths)) => format!(
                "{}: {} ({:.2}% pass) -> {}",
                self.input.display(),
                recommendation,
                pass_pct,
                paths.markdown.display()
            ),
            Err(e) => format!("{}: error: {}", self.input.display(), e),
        }
    }
}

fn file_label(input: &Path, with_parent: bool) -> String {
    let name = |part: Option<&std::ffi::OsStr>| part.and_then(|s| s.to_str()).map(String::from);
    let stem = name(input.file_stem()).unwrap_or_else(|| "input".to_string());
    let parent = input.parent().and_then(|p| name(p.file_name()));
    match parent {
        Some(parent) if with_parent => format!("{parent}_{stem}"),
        _ => stem,
    }
}

/// Metadata for one batch input, labelled by its file stem.
fn metadata_for(input: &Path, project: Option<&str>, release: &str) -> ReportMetadata {
    labelled_metadata(file_label(input, false), project, release)
}

fn labelled_metadata(label: String, project: Option<&str>, release: &str) -> ReportMetadata {
    ReportMetadata {
        project: match project {
            Some(p) => format!("{p}_{label}"),
            None => label,
        },
        release: release.to_string(),
        ..ReportMetadata::default()
    }
}

/// Metadata for every input, with pairwise distinct artifact base names.
/// Inputs sharing a stem are labelled with their parent directory too; any
/// name still taken gets a numeric suffix.
fn batch_metadata(files: &[PathBuf], project: Option<&str>, release: &str) -> Vec<ReportMetadata> {
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for input in files {
        *stem_counts
            .entry(metadata_for(input, project, release).base_name())
            .or_default() += 1;
    }

    let mut used = HashSet::new();
    files
        .iter()
        .map(|input| {
            let mut metadata = metadata_for(input, project, release);
            if stem_counts[&metadata.base_name()] > 1 {
                metadata = labelled_metadata(file_label(input, true), project, release);
            }
            let label = metadata.project.clone();
            let mut suffix = 1;
            while !used.insert(metadata.base_name()) {
                suffix += 1;
                metadata.project = format!("{label}_{suffix}");
            }
            metadata
        })
        .collect()
}

/// Run one independent pipeline per file. Failures of one input never
/// stop the others.
pub fn run_batch(
    config: &BatchConfig,
    report_config: &ReportConfig,
    narrator: &dyn NarrativeGenerator,
) -> Vec<BatchOutcome> {
    set_progress(0, config.files.len());
    let metadata = batch_metadata(&config.files, config.project.as_deref(), &config.release);
    config
        .files
        .par_iter()
        .zip(metadata)
        .map(|(input, metadata)| {
            let request = PipelineRequest {
                input: input.clone(),
                metadata,
                quality_gate: config.quality_gate.clone(),
            };
            let result = run_pipeline(&request, report_config, narrator)
                .and_then(|output| {
                    let paths = write_artifacts(&output, &config.outdir)?;
                    Ok((
                        output.report.recommendation,
                        output.report.summary.pass_pct,
                        paths,
                    ))
                })
                .map_err(|e| {
                    warn!("Batch input {} failed: {}", input.display(), e);
                    e.to_string()
                });
            increment_processed();
            BatchOutcome {
                input: input.clone(),
                result,
            }
        })
        .collect()
}

/// Returns the number of inputs that failed.
pub fn handle_batch(config: BatchConfig) -> Result<usize> {
    let report_config = load_report_config(config.config.as_deref())?;
    let narrator = select_narrator(
        config.narrator.as_deref(),
        config.skip_narrative,
        config.narrator_timeout,
    );

    info!("Processing {} inputs", config.files.len());
    let outcomes = run_batch(&config, &report_config, narrator.as_ref());

    let mut failures = 0;
    for outcome in &outcomes {
        if outcome.result.is_err() {
            failures += 1;
            println!("{}", outcome.line().red());
        } else {
            println!("{}", outcome.line());
        }
    }
    Ok(failures)
}
