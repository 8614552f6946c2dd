use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::core::ReportConfig;
use super::overrides::{apply_env_overrides, apply_field_overrides, default_env_mappings, EnvSource};
use crate::core::{Error, Result};

/// File names looked for in each directory, in priority order.
pub const CONFIG_FILE_NAMES: [&str; 4] = [".tsrgen.toml", "tsrgen.yaml", "tsrgen.yml", "tsrgen.json"];

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Sections merged key by key rather than replaced.
const KEYED_SECTIONS: [&str; 3] = ["quality_gates", "sign_off", "test_environment"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Parse configuration text into an untyped tree.
pub fn parse_config_str(contents: &str, format: ConfigFormat) -> Result<Value> {
    let value = match format {
        ConfigFormat::Yaml => serde_yaml::from_str::<Value>(contents)?,
        ConfigFormat::Json => serde_json::from_str::<Value>(contents)?,
        ConfigFormat::Toml => toml::from_str::<Value>(contents)?,
    };
    // An empty YAML document parses as null
    Ok(if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    })
}

pub(crate) fn read_config_value(path: &Path) -> Result<Value> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| {
        Error::config_with_path(
            "unsupported configuration format, expected .yaml, .yml, .json or .toml",
            path,
        )
    })?;
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::file_system_io(format!("Failed to read {}", path.display()), path, e))?;
    let value = parse_config_str(&contents, format)
        .map_err(|e| Error::config_with_path(e.to_string(), path))?;
    if !value.is_object() {
        return Err(Error::config_with_path(
            "top level of a configuration file must be a map",
            path,
        ));
    }
    Ok(value)
}

/// Overlay a file tree onto the built-in defaults. Profiles and other keyed
/// sections are replaced entry by entry; everything else is replaced whole.
pub fn merge_config_values(base: &mut Value, overlay: Value) {
    let (Some(base_map), Value::Object(overlay_map)) = (base.as_object_mut(), overlay) else {
        return;
    };

    for (key, value) in overlay_map {
        let keyed = KEYED_SECTIONS.contains(&key.as_str());
        match (base_map.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(entries)) if keyed => {
                existing.extend(entries);
            }
            (_, value) => {
                base_map.insert(key, value);
            }
        }
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for the first configuration file.
pub fn discover_config_file(start: &Path) -> Option<PathBuf> {
    let found = directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH + 1).find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    });
    if found.is_none() {
        log::debug!(
            "No config found after checking {} directories. Using built-in presets.",
            MAX_TRAVERSAL_DEPTH + 1
        );
    }
    found
}

/// Build a configuration from an optional file tree plus the environment.
pub fn build_config(file: Option<Value>, env: &dyn EnvSource) -> Result<ReportConfig> {
    let mut tree = serde_json::to_value(ReportConfig::default())?;
    if let Some(overlay) = file {
        merge_config_values(&mut tree, overlay);
    }

    let mappings = match tree.get("env_mappings") {
        Some(Value::Object(_)) => serde_json::from_value(tree["env_mappings"].clone())
            .map_err(|e| Error::config(format!("invalid env_mappings: {e}")))?,
        _ => default_env_mappings(),
    };
    let applied = apply_env_overrides(&mut tree, &mappings, env);
    if applied > 0 {
        log::debug!("Applied {applied} environment overrides");
    }

    let mut config: ReportConfig =
        serde_json::from_value(tree).map_err(|e| Error::config(e.to_string()))?;
    apply_field_overrides(&mut config, env);
    Ok(config)
}

/// Load the configuration for a run.
///
/// An explicit path must exist. Without one, the working directory and its
/// ancestors are searched, falling back to the built-in presets.
pub fn load_config(explicit: Option<&Path>, env: &dyn EnvSource) -> Result<ReportConfig> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(Error::config_with_path("configuration file not found", path));
        }
        Some(path) => Some(path.to_path_buf()),
        None => match std::env::current_dir() {
            Ok(dir) => discover_config_file(&dir),
            Err(e) => {
                log::warn!("Failed to get current directory: {}. Using built-in presets.", e);
                None
            }
        },
    };

    let file = match &path {
        Some(path) => {
            let value = read_config_value(path)?;
            log::debug!("Loaded config from {}", path.display());
            Some(value)
        }
        None => None,
    };

    build_config(file, env).map_err(|e| match (&e, &path) {
        (Error::Configuration { path: None, message }, Some(p)) => {
            Error::config_with_path(message.clone(), p)
        }
        _ => e,
    })
}
