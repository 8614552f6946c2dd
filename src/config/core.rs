use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::gates::GateProfile;
use super::presets::{builtin_profiles, GatePreset};

/// Root configuration structure for tsrgen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Quality gate profiles keyed by id
    #[serde(default = "builtin_profiles")]
    pub quality_gates: BTreeMap<String, GateProfile>,

    #[serde(default)]
    pub sign_off: SignOffConfig,

    #[serde(default)]
    pub test_environment: TestEnvironmentConfig,

    /// Gate to use when the caller does not name one
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub quality_gate_override: Option<String>,

    /// Environment variable to dotted config path. Replaces the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_mappings: Option<BTreeMap<String, String>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            quality_gates: builtin_profiles(),
            sign_off: SignOffConfig::default(),
            test_environment: TestEnvironmentConfig::default(),
            quality_gate_override: None,
            env_mappings: None,
        }
    }
}

impl ReportConfig {
    pub fn gate(&self, id: &str) -> Option<&GateProfile> {
        self.quality_gates.get(id)
    }

    /// Gate to evaluate: the one the caller names, else the configured
    /// override, else `default`.
    pub fn effective_gate<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.quality_gate_override.as_deref())
            .unwrap_or(GatePreset::Default.as_str())
    }
}

/// Accepts strings, numbers and booleans, since environment overrides are
/// type-converted before they reach this field.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn default_tbd() -> String {
    "TBD".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignOffConfig {
    #[serde(default = "default_tbd")]
    pub test_lead: String,
    #[serde(default = "default_tbd")]
    pub test_engineer: String,
    #[serde(default = "default_tbd")]
    pub dev_lead: String,
    #[serde(default = "default_tbd")]
    pub product_owner: String,
    #[serde(default = "default_tbd")]
    pub qa_manager: String,
    /// chrono strftime format for the sign-off date
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for SignOffConfig {
    fn default() -> Self {
        Self {
            test_lead: default_tbd(),
            test_engineer: default_tbd(),
            dev_lead: default_tbd(),
            product_owner: default_tbd(),
            qa_manager: default_tbd(),
            date_format: default_date_format(),
        }
    }
}

impl SignOffConfig {
    pub(crate) const ENV_FIELDS: [(&'static str, &'static str); 6] = [
        ("TSR_TEST_LEAD", "test_lead"),
        ("TSR_TEST_ENGINEER", "test_engineer"),
        ("TSR_DEV_LEAD", "dev_lead"),
        ("TSR_PRODUCT_OWNER", "product_owner"),
        ("TSR_QA_MANAGER", "qa_manager"),
        ("TSR_DATE_FORMAT", "date_format"),
    ];

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "test_lead" => Some(&mut self.test_lead),
            "test_engineer" => Some(&mut self.test_engineer),
            "dev_lead" => Some(&mut self.dev_lead),
            "product_owner" => Some(&mut self.product_owner),
            "qa_manager" => Some(&mut self.qa_manager),
            "date_format" => Some(&mut self.date_format),
            _ => None,
        }
    }

    /// Today's date rendered with the configured format.
    pub fn formatted_date(&self, date: chrono::NaiveDate) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        // chrono reports an invalid format string as a fmt error
        if write!(out, "{}", date.format(&self.date_format)).is_err() {
            return date.format("%Y-%m-%d").to_string();
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestEnvironmentConfig {
    pub environment_name: String,
    pub software_version: String,
    pub software_details: String,
    pub browsers: String,
    pub database_type: String,
    pub database_version: String,
    pub database_details: String,
    pub deployment_type: String,
    pub load_balancer: String,
    pub monitoring: String,
    pub logging: String,
}

impl Default for TestEnvironmentConfig {
    fn default() -> Self {
        Self {
            environment_name: "Staging".into(),
            software_version: "v1.0.0".into(),
            software_details: "Application v1.0.0".into(),
            browsers: "Chrome, Firefox, Safari, Edge".into(),
            database_type: "PostgreSQL".into(),
            database_version: "14.0".into(),
            database_details: "PostgreSQL 14.0".into(),
            deployment_type: "Docker".into(),
            load_balancer: "NGINX".into(),
            monitoring: "Prometheus".into(),
            logging: "ELK Stack".into(),
        }
    }
}

impl TestEnvironmentConfig {
    pub(crate) const ENV_FIELDS: [(&'static str, &'static str); 11] = [
        ("TSR_ENVIRONMENT_NAME", "environment_name"),
        ("TSR_SOFTWARE_VERSION", "software_version"),
        ("TSR_SOFTWARE_DETAILS", "software_details"),
        ("TSR_BROWSERS", "browsers"),
        ("TSR_DATABASE_TYPE", "database_type"),
        ("TSR_DATABASE_VERSION", "database_version"),
        ("TSR_DATABASE_DETAILS", "database_details"),
        ("TSR_DEPLOYMENT_TYPE", "deployment_type"),
        ("TSR_LOAD_BALANCER", "load_balancer"),
        ("TSR_MONITORING", "monitoring"),
        ("TSR_LOGGING", "logging"),
    ];

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "environment_name" => Some(&mut self.environment_name),
            "software_version" => Some(&mut self.software_version),
            "software_details" => Some(&mut self.software_details),
            "browsers" => Some(&mut self.browsers),
            "database_type" => Some(&mut self.database_type),
            "database_version" => Some(&mut self.database_version),
            "database_details" => Some(&mut self.database_details),
            "deployment_type" => Some(&mut self.deployment_type),
            "load_balancer" => Some(&mut self.load_balancer),
            "monitoring" => Some(&mut self.monitoring),
            "logging" => Some(&mut self.logging),
            _ => None,
        }
    }
}
