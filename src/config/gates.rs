use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pass rate floor applied when a tier omits it.
pub const DEFAULT_MIN_PASS_RATE: f64 = 0.0;
/// Defect ceiling applied when a tier omits it. Large enough to never bind.
pub const UNBOUNDED_DEFECTS: f64 = 999.0;

/// A named quality gate: release thresholds plus descriptive criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GateProfile {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub release_thresholds: ReleaseThresholds,

    /// Free-form criteria shown in listings
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub criteria: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_criteria: BTreeMap<String, serde_json::Value>,

    /// Text keyed by lower-case recommendation ("approved", "conditional", "rejected")
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub release_recommendations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReleaseThresholds {
    #[serde(default)]
    pub approved: TierThresholds,
    #[serde(default)]
    pub conditional: TierThresholds,
}

/// Thresholds as written in configuration. Any field may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TierThresholds {
    #[serde(default)]
    pub min_pass_rate: Option<f64>,
    #[serde(default)]
    pub max_critical_defects: Option<f64>,
    #[serde(default)]
    pub max_major_defects: Option<f64>,
}

impl TierThresholds {
    pub fn new(min_pass_rate: f64, max_critical_defects: f64, max_major_defects: f64) -> Self {
        Self {
            min_pass_rate: Some(min_pass_rate),
            max_critical_defects: Some(max_critical_defects),
            max_major_defects: Some(max_major_defects),
        }
    }

    /// Fill missing fields with the permissive defaults.
    pub fn resolve(&self) -> ResolvedTier {
        ResolvedTier {
            min_pass_rate: self.min_pass_rate.unwrap_or(DEFAULT_MIN_PASS_RATE),
            max_critical_defects: self.max_critical_defects.unwrap_or(UNBOUNDED_DEFECTS),
            max_major_defects: self.max_major_defects.unwrap_or(UNBOUNDED_DEFECTS),
        }
    }
}

/// Thresholds with defaults applied, as the evaluator compares them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTier {
    pub min_pass_rate: f64,
    pub max_critical_defects: f64,
    pub max_major_defects: f64,
}

impl ResolvedTier {
    pub fn admits(&self, pass_rate: f64, critical: usize, major: usize) -> bool {
        pass_rate >= self.min_pass_rate
            && critical as f64 <= self.max_critical_defects
            && major as f64 <= self.max_major_defects
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedThresholds {
    pub approved: ResolvedTier,
    pub conditional: ResolvedTier,
}

impl ReleaseThresholds {
    pub fn resolve(&self) -> ResolvedThresholds {
        ResolvedThresholds {
            approved: self.approved.resolve(),
            conditional: self.conditional.resolve(),
        }
    }
}

/// Render a threshold the way it was most likely written: whole numbers
/// without a fractional part.
pub fn format_threshold(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
