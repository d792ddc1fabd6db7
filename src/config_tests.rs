use super::{
    config_path, config_stub, default_config, load_config, load_or_default, validate_config,
    write_config, IntegrityConfig, CONFIG_SCHEMA_VERSION,
};
use crate::model::SpecType;

#[test]
fn default_config_is_valid_and_round_trips() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = default_config();
    validate_config(&config).expect("default config validates");
    write_config(dir.path(), &config).expect("write config");
    let loaded = load_config(dir.path()).expect("load config");
    assert_eq!(loaded, config);
}

#[test]
fn missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    assert!(!config_path(dir.path()).exists());
    let config = load_or_default(dir.path()).expect("defaults");
    assert_eq!(config, default_config());
}

#[test]
fn partial_config_fills_in_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(
        config_path(dir.path()),
        format!(
            r#"{{ "schema_version": {CONFIG_SCHEMA_VERSION}, "require_tests_for": ["operation"], "implementations": {{ "discovery": false }} }}"#
        ),
    )
    .expect("write partial config");
    let config = load_config(dir.path()).expect("load partial config");
    assert_eq!(config.require_tests_for, vec![SpecType::Operation]);
    assert!(!config.implementations.discovery);
    assert!(config.implementations.explicit);
    assert_eq!(config.implementations.convention_dirs, vec!["src".to_string()]);
    assert_eq!(config.spec_patterns, default_config().spec_patterns);
}

#[test]
fn validate_rejects_bad_inputs() {
    let mut config = default_config();
    config.schema_version = 99;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.ignore.push("src/[".to_string());
    let err = validate_config(&config).unwrap_err();
    assert!(format!("{err:#}").contains("ignore"));

    let mut config = default_config();
    config.implementations.convention_dirs = vec!["../outside".to_string()];
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.require_tests_for = vec![SpecType::Feature];
    assert!(validate_config(&config).is_err());
}

#[test]
fn config_stub_parses_back() {
    let stub = config_stub().expect("stub");
    let parsed: IntegrityConfig = serde_json::from_str(&stub).expect("parse stub");
    assert_eq!(parsed, default_config());
}
