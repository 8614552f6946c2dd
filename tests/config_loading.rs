use indoc::indoc;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;
use tsrgen::config::{
    build_config, discover_config_file, load_config, validate_config, ReportConfig,
    STARTER_CONFIG,
};
use tsrgen::{Error, QualityGateEvaluator, Recommendation};

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn yaml_profile_replaces_preset_and_keeps_others() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tsrgen.yaml");
    fs::write(
        &path,
        indoc! {"
            quality_gates:
              default:
                name: Team Default
                release_thresholds:
                  approved:
                    min_pass_rate: 80
                  conditional:
                    min_pass_rate: 60
            sign_off:
              test_lead: Dana
        "},
    )
    .unwrap();

    let config = load_config(Some(&path), &env(&[])).unwrap();
    let default = config.gate("default").unwrap();
    assert_eq!(default.name, "Team Default");
    assert_eq!(default.release_thresholds.approved.min_pass_rate, Some(80.0));
    assert_eq!(default.release_thresholds.approved.max_major_defects, None);
    assert!(config.gate("strict").is_some());
    assert_eq!(config.sign_off.test_lead, "Dana");
    assert_eq!(config.sign_off.qa_manager, "TBD");
}

#[test]
fn toml_and_json_files_load() {
    let temp = TempDir::new().unwrap();
    let toml_path = temp.path().join(".tsrgen.toml");
    fs::write(
        &toml_path,
        indoc! {r#"
            quality_gate_override = "strict"

            [test_environment]
            environment_name = "UAT"
        "#},
    )
    .unwrap();
    let config = load_config(Some(&toml_path), &env(&[])).unwrap();
    assert_eq!(config.quality_gate_override.as_deref(), Some("strict"));
    assert_eq!(config.test_environment.environment_name, "UAT");
    assert_eq!(config.test_environment.database_type, "PostgreSQL");

    let json_path = temp.path().join("tsrgen.json");
    fs::write(&json_path, r#"{"sign_off": {"date_format": "%d/%m/%Y"}}"#).unwrap();
    let config = load_config(Some(&json_path), &env(&[])).unwrap();
    assert_eq!(config.sign_off.date_format, "%d/%m/%Y");
}

#[test]
fn env_override_patches_single_threshold() {
    let config = build_config(
        None,
        &env(&[
            ("TSR_DEFAULT_APPROVED_PASS_RATE", "70"),
            ("TSR_QUALITY_GATE", "default"),
            ("TSR_TEST_LEAD", "Sam"),
        ]),
    )
    .unwrap();
    let default = config.gate("default").unwrap();
    assert_eq!(default.release_thresholds.approved.min_pass_rate, Some(70.0));
    assert_eq!(default.release_thresholds.approved.max_major_defects, Some(2.0));
    assert_eq!(config.quality_gate_override.as_deref(), Some("default"));
    assert_eq!(config.sign_off.test_lead, "Sam");

    let (rec, _) = QualityGateEvaluator::new(&config).evaluate(75.0, 0, 0, "default");
    assert_eq!(rec, Recommendation::Approved);
}

#[test]
fn custom_env_mappings_replace_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tsrgen.yaml");
    fs::write(
        &path,
        indoc! {"
            env_mappings:
              RELEASE_BAR: quality_gates.nightly.release_thresholds.approved.min_pass_rate
        "},
    )
    .unwrap();

    let config = load_config(
        Some(&path),
        &env(&[
            ("RELEASE_BAR", "88.5"),
            ("TSR_DEFAULT_APPROVED_PASS_RATE", "10"),
        ]),
    )
    .unwrap();

    let nightly = config.gate("nightly").unwrap();
    assert_eq!(nightly.release_thresholds.approved.min_pass_rate, Some(88.5));
    let default = config.gate("default").unwrap();
    assert_eq!(default.release_thresholds.approved.min_pass_rate, Some(95.0));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = load_config(Some(&temp.path().join("absent.yaml")), &env(&[])).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn malformed_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tsrgen.yaml");
    fs::write(&path, "quality_gates: [unclosed").unwrap();
    assert!(load_config(Some(&path), &env(&[])).is_err());

    let path = temp.path().join("tsrgen.ini");
    fs::write(&path, "a=b").unwrap();
    assert!(load_config(Some(&path), &env(&[])).is_err());
}

#[test]
fn discovery_walks_up_from_nested_directory() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tsrgen.yml"), STARTER_CONFIG).unwrap();
    let nested = temp.path().join("a/b/c");
    fs::create_dir_all(&nested).unwrap();

    let found = discover_config_file(&nested).unwrap();
    assert_eq!(found, temp.path().join("tsrgen.yml"));
}

#[test]
fn toml_wins_over_yaml_in_same_directory() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tsrgen.yaml"), "{}").unwrap();
    fs::write(temp.path().join(".tsrgen.toml"), "").unwrap();
    assert_eq!(
        discover_config_file(temp.path()).unwrap(),
        temp.path().join(".tsrgen.toml")
    );
}

#[test]
fn validation_reports_every_problem() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tsrgen.yaml");
    fs::write(
        &path,
        indoc! {"
            quality_gates:
              strict:
                name: ''
                release_thresholds:
                  approved:
                    min_pass_rate: 120
                  conditional:
                    min_pass_rate: 50
            quality_gate_override: missing
        "},
    )
    .unwrap();

    let config = load_config(Some(&path), &env(&[])).unwrap();
    let problems = validate_config(&config);
    assert!(problems.len() >= 3, "{problems:?}");
    assert!(validate_config(&ReportConfig::default()).is_empty());
}
