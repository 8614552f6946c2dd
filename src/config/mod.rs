//! Report configuration: quality gate profiles, sign-off and test
//! environment details.
//!
//! Configuration is loaded explicitly and passed down; there is no global
//! instance. See [`load_config`] for the discovery order.

mod core;
pub mod gates;
mod loader;
pub mod overrides;
pub mod presets;
pub mod validation;

pub use self::core::{ReportConfig, SignOffConfig, TestEnvironmentConfig};
pub use gates::{
    format_threshold, GateProfile, ReleaseThresholds, ResolvedThresholds, ResolvedTier,
    TierThresholds,
};
pub use loader::{
    build_config, directory_ancestors, discover_config_file, load_config, merge_config_values,
    parse_config_str, ConfigFormat, CONFIG_FILE_NAMES,
};
pub use overrides::{EnvSource, ProcessEnv};
pub use presets::{builtin_profiles, GatePreset};
pub use validation::{validate_config, validate_config_result};

/// Starter configuration written by `tsrgen init`.
pub const STARTER_CONFIG: &str = r#"# tsrgen configuration
#
# Profiles listed here replace the built-in profile of the same id.
# Environment variables such as TSR_DEFAULT_APPROVED_PASS_RATE override
# individual thresholds at load time.

quality_gates:
  default:
    name: Default Quality Gate
    description: Standard release criteria for most projects
    release_thresholds:
      approved:
        min_pass_rate: 95
        max_critical_defects: 0
        max_major_defects: 2
      conditional:
        min_pass_rate: 85
        max_critical_defects: 0
        max_major_defects: 5
    release_recommendations:
      approved: Release is approved for production deployment.
      conditional: Release may proceed once the listed risks are accepted by stakeholders.
      rejected: Release is not recommended until blocking defects are resolved.

sign_off:
  test_lead: TBD
  test_engineer: TBD
  dev_lead: TBD
  product_owner: TBD
  qa_manager: TBD
  date_format: "%Y-%m-%d"

test_environment:
  environment_name: Staging
  software_version: v1.0.0
"#;
