//! Environment variable overrides.
//!
//! Gate thresholds are patched on the untyped configuration tree through a
//! table of `VAR -> dotted.path` mappings. Sign-off and test environment
//! fields are patched on the typed config afterwards.

use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};

use super::core::{ReportConfig, SignOffConfig, TestEnvironmentConfig};
use super::presets::GatePreset;

/// Source of environment variables. Production reads the process
/// environment; tests pass a map.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

pub const QUALITY_GATE_VAR: &str = "TSR_QUALITY_GATE";

const TIER_FIELDS: [(&str, &str); 3] = [
    ("PASS_RATE", "min_pass_rate"),
    ("CRITICAL_DEFECTS", "max_critical_defects"),
    ("MAJOR_DEFECTS", "max_major_defects"),
];

/// Built-in mapping table, used unless the config file supplies its own.
pub fn default_env_mappings() -> BTreeMap<String, String> {
    let mut mappings = BTreeMap::new();
    mappings.insert(
        QUALITY_GATE_VAR.to_string(),
        "quality_gate_override".to_string(),
    );

    for preset in GatePreset::ALL {
        let gate = preset.as_str();
        for tier in ["approved", "conditional"] {
            for (suffix, field) in TIER_FIELDS {
                mappings.insert(
                    format!(
                        "TSR_{}_{}_{}",
                        gate.to_uppercase(),
                        tier.to_uppercase(),
                        suffix
                    ),
                    format!("quality_gates.{gate}.release_thresholds.{tier}.{field}"),
                );
            }
        }
    }
    mappings
}

/// Convert a raw environment string, trying integer, then float, then
/// boolean, and finally keeping it as a string.
pub fn convert_env_value(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match raw.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Set `value` at a dotted path, creating intermediate maps as needed.
/// Fails when an intermediate key holds a non-map value.
pub fn set_nested_value(root: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let keys: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = keys.split_last() else {
        return Err("empty path".to_string());
    };

    let mut current = root;
    for key in parents {
        current = descend(current, key, path)?;
    }

    as_object(current, path)?.insert((*last).to_string(), value);
    Ok(())
}

fn descend<'a>(current: &'a mut Value, key: &str, path: &str) -> Result<&'a mut Value, String> {
    let map = as_object(current, path)?;
    let child = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if child.is_null() {
        *child = Value::Object(Map::new());
    }
    Ok(child)
}

fn as_object<'a>(value: &'a mut Value, path: &str) -> Result<&'a mut Map<String, Value>, String> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    value
        .as_object_mut()
        .ok_or_else(|| format!("cannot descend into non-map value on path '{path}'"))
}

/// Apply every mapped variable that is set. Failures are logged and skipped.
pub fn apply_env_overrides(
    tree: &mut Value,
    mappings: &BTreeMap<String, String>,
    env: &dyn EnvSource,
) -> usize {
    let mut applied = 0;
    for (var, path) in mappings {
        let Some(raw) = env.var(var) else { continue };
        match set_nested_value(tree, path, convert_env_value(&raw)) {
            Ok(()) => {
                log::debug!("Applied environment override: {var}={raw} -> {path}");
                applied += 1;
            }
            Err(e) => log::warn!("Failed to apply environment override {var}={raw}: {e}"),
        }
    }
    applied
}

/// Overwrite sign-off and test environment fields from their variables.
pub fn apply_field_overrides(config: &mut ReportConfig, env: &dyn EnvSource) {
    for (var, field) in SignOffConfig::ENV_FIELDS {
        if let (Some(value), Some(slot)) = (env.var(var), config.sign_off.field_mut(field)) {
            *slot = value;
        }
    }
    for (var, field) in TestEnvironmentConfig::ENV_FIELDS {
        if let (Some(value), Some(slot)) = (env.var(var), config.test_environment.field_mut(field)) {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_mappings_cover_every_gate_tier_and_field() {
        let mappings = default_env_mappings();
        assert_eq!(mappings.len(), 4 * 2 * 3 + 1);
        assert_eq!(
            mappings["TSR_STRICT_CONDITIONAL_MAJOR_DEFECTS"],
            "quality_gates.strict.release_thresholds.conditional.max_major_defects"
        );
        assert_eq!(mappings["TSR_QUALITY_GATE"], "quality_gate_override");
    }

    #[test]
    fn test_convert_env_value_order() {
        assert_eq!(convert_env_value("42"), json!(42));
        assert_eq!(convert_env_value("97.5"), json!(97.5));
        assert_eq!(convert_env_value("TRUE"), json!(true));
        assert_eq!(convert_env_value("false"), json!(false));
        assert_eq!(convert_env_value("strict"), json!("strict"));
    }

    #[test]
    fn test_set_nested_value_creates_intermediate_maps() {
        let mut tree = json!({});
        set_nested_value(&mut tree, "a.b.c", json!(1)).unwrap();
        assert_eq!(tree, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_nested_value_rejects_scalar_intermediate() {
        let mut tree = json!({"a": 5});
        assert!(set_nested_value(&mut tree, "a.b", json!(1)).is_err());
        assert_eq!(tree, json!({"a": 5}));
    }

    #[test]
    fn test_override_patches_single_threshold() {
        let mut tree = serde_json::to_value(ReportConfig::default()).unwrap();
        let applied = apply_env_overrides(
            &mut tree,
            &default_env_mappings(),
            &env(&[("TSR_DEFAULT_APPROVED_PASS_RATE", "90")]),
        );
        assert_eq!(applied, 1);

        let config: ReportConfig = serde_json::from_value(tree).unwrap();
        let default = &config.quality_gates["default"].release_thresholds;
        assert_eq!(default.approved.min_pass_rate, Some(90.0));
        assert_eq!(default.approved.max_major_defects, Some(2.0));
        assert_eq!(default.conditional.min_pass_rate, Some(85.0));
    }

    #[test]
    fn test_field_overrides() {
        let mut config = ReportConfig::default();
        apply_field_overrides(
            &mut config,
            &env(&[("TSR_TEST_LEAD", "Dana"), ("TSR_BROWSERS", "Firefox")]),
        );
        assert_eq!(config.sign_off.test_lead, "Dana");
        assert_eq!(config.sign_off.qa_manager, "TBD");
        assert_eq!(config.test_environment.browsers, "Firefox");
    }
}
