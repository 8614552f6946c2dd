use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{GateEvaluation, Recommendation};
use crate::config::{
    format_threshold, GatePreset, GateProfile, ReportConfig, ResolvedThresholds, ResolvedTier,
};

/// Profile used when the requested one does not exist.
pub const DEFAULT_GATE: &str = "default";

/// Thresholds and additional criteria of one profile, for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct GateCriteria {
    pub release_thresholds: ResolvedThresholds,
    pub criteria: BTreeMap<String, serde_json::Value>,
    pub additional_criteria: BTreeMap<String, serde_json::Value>,
}

/// Evaluates release readiness against the profiles of a loaded config.
pub struct QualityGateEvaluator<'a> {
    gates: &'a BTreeMap<String, GateProfile>,
}

impl<'a> QualityGateEvaluator<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self {
            gates: &config.quality_gates,
        }
    }

    pub fn from_profiles(gates: &'a BTreeMap<String, GateProfile>) -> Self {
        Self { gates }
    }

    /// Resolve a profile id, substituting the default profile for unknown ids.
    fn profile(&self, requested: &str) -> (String, Cow<'a, GateProfile>) {
        if let Some(profile) = self.gates.get(requested) {
            return (requested.to_string(), Cow::Borrowed(profile));
        }
        warn!("Quality gate '{}' not found, using '{}'", requested, DEFAULT_GATE);
        let profile = match self.gates.get(DEFAULT_GATE) {
            Some(profile) => Cow::Borrowed(profile),
            None => Cow::Owned(GatePreset::Default.to_profile()),
        };
        (DEFAULT_GATE.to_string(), profile)
    }

    pub fn evaluate(
        &self,
        pass_rate: f64,
        critical_defects: usize,
        major_defects: usize,
        quality_gate: &str,
    ) -> (Recommendation, GateEvaluation) {
        let (gate_id, profile) = self.profile(quality_gate);
        let thresholds = profile.release_thresholds.resolve();

        let (recommendation, reason) =
            if thresholds.approved.admits(pass_rate, critical_defects, major_defects) {
                (
                    Recommendation::Approved,
                    met_reason(&thresholds.approved, pass_rate, critical_defects, major_defects),
                )
            } else if thresholds.conditional.admits(pass_rate, critical_defects, major_defects) {
                (
                    Recommendation::Conditional,
                    met_reason(&thresholds.conditional, pass_rate, critical_defects, major_defects),
                )
            } else {
                (
                    Recommendation::Rejected,
                    failed_reason(&thresholds.conditional, pass_rate, critical_defects, major_defects),
                )
            };

        info!(
            "Release recommendation: {} (Quality Gate: {})",
            recommendation, gate_id
        );

        let gate_name = if profile.name.is_empty() {
            gate_id.clone()
        } else {
            profile.name.clone()
        };

        let evaluation = GateEvaluation {
            quality_gate_used: gate_id,
            gate_name,
            pass_rate,
            critical_defects,
            major_defects,
            criteria_met: recommendation.is_release_allowed(),
            reason,
            release_thresholds: thresholds,
            additional_criteria: profile.additional_criteria.clone(),
        };
        (recommendation, evaluation)
    }

    /// Profile ids mapped to their display names.
    pub fn available_gates(&self) -> BTreeMap<String, String> {
        self.gates
            .iter()
            .map(|(id, profile)| {
                let name = if profile.name.is_empty() {
                    id.clone()
                } else {
                    profile.name.clone()
                };
                (id.clone(), name)
            })
            .collect()
    }

    pub fn criteria(&self, quality_gate: &str) -> GateCriteria {
        let (_, profile) = self.profile(quality_gate);
        GateCriteria {
            release_thresholds: profile.release_thresholds.resolve(),
            criteria: profile.criteria.clone(),
            additional_criteria: profile.additional_criteria.clone(),
        }
    }

    /// Configured text for a recommendation, if the profile provides one.
    pub fn recommendation_text(
        &self,
        quality_gate: &str,
        recommendation: Recommendation,
    ) -> Option<String> {
        let (_, profile) = self.profile(quality_gate);
        profile
            .release_recommendations
            .get(recommendation.key())
            .cloned()
    }
}

fn met_reason(tier: &ResolvedTier, pass_rate: f64, critical: usize, major: usize) -> String {
    format!(
        "Pass rate {:.1}% >= {}%, Critical defects {} <= {}, Major defects {} <= {}",
        pass_rate,
        format_threshold(tier.min_pass_rate),
        critical,
        format_threshold(tier.max_critical_defects),
        major,
        format_threshold(tier.max_major_defects)
    )
}

fn failed_reason(tier: &ResolvedTier, pass_rate: f64, critical: usize, major: usize) -> String {
    let mut failed = Vec::new();
    // Mirrors ResolvedTier::admits: a NaN pass rate fails the pass rate check.
    let pass_rate_met = pass_rate >= tier.min_pass_rate;
    let critical_met = critical as f64 <= tier.max_critical_defects;
    let major_met = major as f64 <= tier.max_major_defects;
    if !pass_rate_met {
        failed.push(format!(
            "Pass rate {:.1}% < {}%",
            pass_rate,
            format_threshold(tier.min_pass_rate)
        ));
    }
    if !critical_met {
        failed.push(format!(
            "Critical defects {} > {}",
            critical,
            format_threshold(tier.max_critical_defects)
        ));
    }
    if !major_met {
        failed.push(format!(
            "Major defects {} > {}",
            major,
            format_threshold(tier.max_major_defects)
        ));
    }
    failed.join("; ")
}
