// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod metrics;
pub mod narrative;
pub mod normalize;
pub mod observability;
pub mod pipeline;
pub mod quality_gate;
pub mod report;

// Re-export commonly used types
pub use crate::core::{
    CanonicalColumn, CanonicalRecord, CanonicalTable, Error, Priority, RawRecordSet, RawRow,
    RawValue, Result, Severity, TestResult,
};

pub use crate::config::{load_config, GatePreset, ReportConfig};

pub use crate::io::{create_writer, read_records, render_to_string, OutputFormat, OutputWriter};

pub use crate::metrics::{compute as compute_metrics, MetricsBundle};

pub use crate::narrative::{CommandNarrator, NarrativeError, NarrativeGenerator, StubNarrator};

pub use crate::normalize::normalize;

pub use crate::pipeline::{build_report, run_pipeline, write_artifacts, PipelineRequest};

pub use crate::quality_gate::{GateEvaluation, QualityGateEvaluator, Recommendation};

pub use crate::report::{ReportContext, ReportMetadata};
