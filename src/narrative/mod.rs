//! Narrative sections produced by an external collaborator.
//!
//! A [`NarrativeGenerator`] turns a request into JSON which is then checked
//! against the typed contracts in [`contract`]. Any failure is recoverable:
//! the deterministic [`StubNarrator`] fills in and a warning is recorded for
//! the report.

mod command;
pub mod contract;
mod prompt;
mod stub;

pub use command::CommandNarrator;
pub use contract::{
    parse_response, AnalysisNarrative, ExitCriteria, IngestionReadiness, KeyFindings,
    NarrativeContract, ReportNarrative,
};
pub use prompt::build_prompt;
pub use stub::StubNarrator;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::config::SignOffConfig;
use crate::core::CanonicalTable;
use crate::metrics::MetricsBundle;
use crate::quality_gate::{GateEvaluation, Recommendation};
use crate::report::ReportMetadata;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative agent '{agent}' unavailable: {message}")]
    AgentUnavailable { agent: String, message: String },

    #[error("narrative agent '{agent}' returned an invalid response: {message}")]
    InvalidResponse { agent: String, message: String },
}

impl NarrativeError {
    pub fn unavailable(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AgentUnavailable {
            agent: agent.into(),
            message: message.into(),
        }
    }

    pub fn invalid(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            agent: agent.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeKind {
    Ingestion,
    Analysis,
    Report,
}

impl NarrativeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NarrativeKind::Ingestion => "ingestion",
            NarrativeKind::Analysis => "analysis",
            NarrativeKind::Report => "report",
        }
    }
}

impl fmt::Display for NarrativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for one narrative section.
#[derive(Debug, Clone, Copy)]
pub enum NarrativeRequest<'a> {
    Ingestion {
        file_type: &'a str,
        table: &'a CanonicalTable,
    },
    Analysis {
        metrics: &'a MetricsBundle,
    },
    Report {
        metrics: &'a MetricsBundle,
        recommendation: Recommendation,
        evaluation: &'a GateEvaluation,
        metadata: &'a ReportMetadata,
        sign_off: &'a SignOffConfig,
    },
}

impl NarrativeRequest<'_> {
    pub fn kind(&self) -> NarrativeKind {
        match self {
            NarrativeRequest::Ingestion { .. } => NarrativeKind::Ingestion,
            NarrativeRequest::Analysis { .. } => NarrativeKind::Analysis,
            NarrativeRequest::Report { .. } => NarrativeKind::Report,
        }
    }
}

/// Produces narrative JSON for a request.
pub trait NarrativeGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, request: &NarrativeRequest<'_>) -> Result<serde_json::Value, NarrativeError>;
}

/// The three narrative sections of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narratives {
    pub readiness: IngestionReadiness,
    pub analysis: AnalysisNarrative,
    pub report: ReportNarrative,
}

/// Ask `generator` for a section, falling back to the stub on any failure.
/// Fallbacks are described in `warnings`.
pub fn generate_with_fallback<T: NarrativeContract>(
    generator: &dyn NarrativeGenerator,
    request: &NarrativeRequest<'_>,
    warnings: &mut Vec<String>,
) -> T {
    let kind = request.kind();
    let _span = info_span!("narrative", kind = kind.as_str(), agent = generator.name()).entered();

    match generator
        .generate(request)
        .and_then(|value| T::from_value(generator.name(), value))
    {
        Ok(section) => {
            debug!("Narrative '{}' accepted from '{}'", kind, generator.name());
            section
        }
        Err(e) => {
            warn!("{}; using deterministic {} narrative", e, kind);
            warnings.push(format!("{kind} narrative fell back to the built-in generator: {e}"));
            stub_section(request)
        }
    }
}

fn stub_section<T: NarrativeContract>(request: &NarrativeRequest<'_>) -> T {
    let stub = StubNarrator;
    // The stub output is built from typed values and always satisfies the contract
    match stub
        .generate(request)
        .and_then(|value| T::from_value(stub.name(), value))
    {
        Ok(section) => section,
        Err(e) => {
            warn!("built-in narrative failed validation: {}", e);
            T::placeholder()
        }
    }
}
