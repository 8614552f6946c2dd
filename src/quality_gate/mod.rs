//! Release recommendation from pass rate and open defect counts.

mod evaluator;

pub use evaluator::{GateCriteria, QualityGateEvaluator, DEFAULT_GATE};

use crate::config::ResolvedThresholds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Approved,
    Conditional,
    Rejected,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Approved => "APPROVED",
            Recommendation::Conditional => "CONDITIONAL",
            Recommendation::Rejected => "REJECTED",
        }
    }

    /// Key used in a profile's `release_recommendations` table.
    pub fn key(self) -> &'static str {
        match self {
            Recommendation::Approved => "approved",
            Recommendation::Conditional => "conditional",
            Recommendation::Rejected => "rejected",
        }
    }

    pub fn is_release_allowed(self) -> bool {
        self != Recommendation::Rejected
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the evaluator looked at and concluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvaluation {
    /// Profile id actually used, after any fallback
    pub quality_gate_used: String,
    pub gate_name: String,
    pub pass_rate: f64,
    pub critical_defects: usize,
    pub major_defects: usize,
    pub criteria_met: bool,
    pub reason: String,
    /// Thresholds with defaults applied
    pub release_thresholds: ResolvedThresholds,
    pub additional_criteria: BTreeMap<String, serde_json::Value>,
}
