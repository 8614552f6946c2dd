//! Validation with error accumulation for configuration.
//!
//! Every problem is collected so a single `gates --check` run reports all of
//! them.

use super::core::ReportConfig;
use super::gates::{GateProfile, ResolvedTier};
use super::presets::GatePreset;

/// Validate the configuration, returning every problem found.
pub fn validate_config(config: &ReportConfig) -> Vec<String> {
    let mut errors = Vec::new();

    for preset in GatePreset::ALL {
        if !config.quality_gates.contains_key(preset.as_str()) {
            errors.push(format!("Missing required quality gate: {}", preset.as_str()));
        }
    }

    for (id, profile) in &config.quality_gates {
        errors.extend(validate_profile(id, profile));
    }

    if let Some(gate) = &config.quality_gate_override {
        if !config.quality_gates.contains_key(gate) {
            errors.push(format!("quality_gate_override names unknown gate '{gate}'"));
        }
    }

    errors
}

/// Backwards-compatible fail-fast wrapper.
pub fn validate_config_result(config: &ReportConfig) -> anyhow::Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed:\n  - {}", errors.join("\n  - "))
    }
}

fn validate_profile(id: &str, profile: &GateProfile) -> Vec<String> {
    let mut errors = Vec::new();
    if profile.name.trim().is_empty() {
        errors.push(format!("quality_gates.{id}.name must not be empty"));
    }

    let thresholds = profile.release_thresholds.resolve();
    validate_tier(id, "approved", &thresholds.approved, &mut errors);
    validate_tier(id, "conditional", &thresholds.conditional, &mut errors);

    let (approved, conditional) = (thresholds.approved, thresholds.conditional);
    if conditional.min_pass_rate > approved.min_pass_rate
        || conditional.max_critical_defects < approved.max_critical_defects
        || conditional.max_major_defects < approved.max_major_defects
    {
        errors.push(format!(
            "quality_gates.{id}: conditional thresholds are stricter than approved thresholds"
        ));
    }
    errors
}

fn validate_tier(id: &str, tier: &str, t: &ResolvedTier, errors: &mut Vec<String>) {
    let field = |name: &str| format!("quality_gates.{id}.release_thresholds.{tier}.{name}");

    if !(0.0..=100.0).contains(&t.min_pass_rate) {
        errors.push(format!(
            "{}: must be between 0 and 100 (got {})",
            field("min_pass_rate"),
            t.min_pass_rate
        ));
    }
    for (name, value) in [
        ("max_critical_defects", t.max_critical_defects),
        ("max_major_defects", t.max_major_defects),
    ] {
        if value < 0.0 {
            errors.push(format!("{}: must not be negative (got {})", field(name), value));
        }
    }
}
