//! Built-in quality gate presets.
//!
//! - **default**: standard release gate
//! - **strict**: zero major defects for approval
//! - **lenient**: tolerates a critical defect for a conditional release
//! - **custom**: starting point for project-specific tuning
//!
//! Profiles loaded from a configuration file replace the preset of the same
//! name wholesale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::gates::{GateProfile, ReleaseThresholds, TierThresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePreset {
    Default,
    Strict,
    Lenient,
    Custom,
}

impl GatePreset {
    pub const ALL: [GatePreset; 4] = [
        GatePreset::Default,
        GatePreset::Strict,
        GatePreset::Lenient,
        GatePreset::Custom,
    ];

    pub fn thresholds(self) -> ReleaseThresholds {
        let (approved, conditional) = match self {
            GatePreset::Default | GatePreset::Custom => {
                (TierThresholds::new(95.0, 0.0, 2.0), TierThresholds::new(85.0, 0.0, 5.0))
            }
            GatePreset::Strict => {
                (TierThresholds::new(98.0, 0.0, 0.0), TierThresholds::new(90.0, 0.0, 2.0))
            }
            GatePreset::Lenient => {
                (TierThresholds::new(90.0, 0.0, 5.0), TierThresholds::new(75.0, 1.0, 10.0))
            }
        };
        ReleaseThresholds {
            approved,
            conditional,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            GatePreset::Default => "Default Quality Gate",
            GatePreset::Strict => "Strict Quality Gate",
            GatePreset::Lenient => "Lenient Quality Gate",
            GatePreset::Custom => "Custom Quality Gate",
        }
    }

    fn description(self) -> &'static str {
        match self {
            GatePreset::Default => "Standard release criteria for most projects",
            GatePreset::Strict => "High bar for regulated or customer-critical releases",
            GatePreset::Lenient => "Relaxed criteria for early or internal releases",
            GatePreset::Custom => "Project-specific criteria, tune via configuration",
        }
    }

    pub fn to_profile(self) -> GateProfile {
        let thresholds = self.thresholds();
        let approved = thresholds.approved.resolve();

        let mut criteria = BTreeMap::new();
        criteria.insert("min_pass_rate".to_string(), approved.min_pass_rate.into());
        criteria.insert(
            "max_critical_defects".to_string(),
            approved.max_critical_defects.into(),
        );
        criteria.insert(
            "max_major_defects".to_string(),
            approved.max_major_defects.into(),
        );

        let release_recommendations = [
            ("approved", "Release is approved for production deployment."),
            (
                "conditional",
                "Release may proceed once the listed risks are accepted by stakeholders.",
            ),
            (
                "rejected",
                "Release is not recommended until blocking defects are resolved.",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        GateProfile {
            name: self.display_name().to_string(),
            description: self.description().to_string(),
            release_thresholds: thresholds,
            criteria,
            additional_criteria: BTreeMap::new(),
            release_recommendations,
        }
    }

    /// Parse preset from string name (returns Option instead of Result).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Some(GatePreset::Default),
            "strict" => Some(GatePreset::Strict),
            "lenient" | "permissive" => Some(GatePreset::Lenient),
            "custom" => Some(GatePreset::Custom),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GatePreset::Default => "default",
            GatePreset::Strict => "strict",
            GatePreset::Lenient => "lenient",
            GatePreset::Custom => "custom",
        }
    }
}

impl FromStr for GatePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Invalid quality gate preset: '{}'. Valid options: default, strict, lenient, custom",
                s
            )
        })
    }
}

/// All four presets keyed by their id.
pub fn builtin_profiles() -> BTreeMap<String, GateProfile> {
    GatePreset::ALL
        .into_iter()
        .map(|p| (p.as_str().to_string(), p.to_profile()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_cover_every_preset() {
        let profiles = builtin_profiles();
        assert_eq!(profiles.len(), 4);
        for preset in GatePreset::ALL {
            assert!(profiles.contains_key(preset.as_str()));
        }
    }

    #[test]
    fn test_default_preset_values() {
        let t = GatePreset::Default.thresholds().resolve();
        assert_eq!(t.approved.min_pass_rate, 95.0);
        assert_eq!(t.approved.max_critical_defects, 0.0);
        assert_eq!(t.approved.max_major_defects, 2.0);
        assert_eq!(t.conditional.min_pass_rate, 85.0);
        assert_eq!(t.conditional.max_major_defects, 5.0);
    }

    #[test]
    fn test_lenient_allows_one_conditional_critical() {
        let t = GatePreset::Lenient.thresholds().resolve();
        assert_eq!(t.conditional.max_critical_defects, 1.0);
        assert_eq!(t.conditional.min_pass_rate, 75.0);
    }

    #[test]
    fn test_parse_round_trips_names() {
        for preset in GatePreset::ALL {
            assert_eq!(GatePreset::parse(preset.as_str()), Some(preset));
        }
        assert_eq!(GatePreset::parse(" STRICT "), Some(GatePreset::Strict));
        assert_eq!(GatePreset::parse("permissive"), Some(GatePreset::Lenient));
        assert!("bogus".parse::<GatePreset>().is_err());
    }
}
