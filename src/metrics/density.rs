use super::defects::EffectiveSeverities;
use super::round_to;
use crate::core::{CanonicalRecord, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Density above which a module is high risk.
pub const HIGH_RISK_DENSITY: f64 = 0.3;
/// Density above which a module is medium risk.
pub const MEDIUM_RISK_DENSITY: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn classify(density: f64) -> Self {
        if density > HIGH_RISK_DENSITY {
            RiskLevel::High
        } else if density > MEDIUM_RISK_DENSITY {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleDensity {
    /// Unique bug ids observed in the module
    pub total: usize,
    pub density: f64,
    pub density_percentage: f64,
    pub total_tests: usize,
    pub critical: usize,
    pub major: usize,
    pub medium: usize,
    pub minor: usize,
    pub risk_level: RiskLevel,
}

#[derive(Default)]
struct SeverityBreakdown {
    critical: usize,
    major: usize,
    medium: usize,
    minor: usize,
}

impl SeverityBreakdown {
    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Major => self.major += 1,
            Severity::Medium => self.medium += 1,
            Severity::Minor => self.minor += 1,
        }
    }
}

/// Defect density for every module with a non-blank name.
pub fn defect_density(
    records: &[CanonicalRecord],
    severities: &EffectiveSeverities,
) -> BTreeMap<String, ModuleDensity> {
    let mut by_module: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        if !record.module.is_empty() {
            by_module.entry(record.module.as_str()).or_default().push(index);
        }
    }

    by_module
        .into_iter()
        .map(|(module, indices)| {
            (
                module.to_string(),
                module_density(records, severities, &indices),
            )
        })
        .collect()
}

fn module_density(
    records: &[CanonicalRecord],
    severities: &EffectiveSeverities,
    indices: &[usize],
) -> ModuleDensity {
    let defect_rows: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&i| records[i].has_bug())
        .collect();
    let unique_bugs = defect_rows
        .iter()
        .map(|&i| records[i].bug_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let total_tests = indices.len();
    let ratio = if total_tests > 0 {
        unique_bugs as f64 / total_tests as f64
    } else {
        0.0
    };

    let breakdown = severity_breakdown(records, severities, &defect_rows, unique_bugs);

    ModuleDensity {
        total: unique_bugs,
        density: round_to(ratio, 3),
        density_percentage: round_to(ratio * 100.0, 1),
        total_tests,
        critical: breakdown.critical,
        major: breakdown.major,
        medium: breakdown.medium,
        minor: breakdown.minor,
        risk_level: RiskLevel::classify(ratio),
    }
}

/// Severity sub-counts for a module's defect rows. Uses severities when the
/// module has any, then priorities, and otherwise books every unique bug as
/// medium.
fn severity_breakdown(
    records: &[CanonicalRecord],
    severities: &EffectiveSeverities,
    defect_rows: &[usize],
    unique_bugs: usize,
) -> SeverityBreakdown {
    let mut breakdown = SeverityBreakdown::default();

    if defect_rows.iter().any(|&i| severities.get(i).is_some()) {
        for severity in defect_rows.iter().filter_map(|&i| severities.get(i)) {
            breakdown.add(severity);
        }
    } else if defect_rows.iter().any(|&i| records[i].priority.is_some()) {
        for priority in defect_rows.iter().filter_map(|&i| records[i].priority) {
            breakdown.add(Severity::from_priority(priority));
        }
    } else {
        breakdown.medium = unique_bugs;
    }

    breakdown
}
