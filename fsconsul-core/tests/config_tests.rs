//! Config loading error messages, format selection, and validation tests.

use assert_fs::prelude::*;
use fsconsul_core::{config, ConfigError, MappingError};
use predicates::prelude::predicate;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_json_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("fsconsul.json");
    file.write_str(r#"{"mappings": [ { "prefix": "#).expect("write");

    let err = config::load_config_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseJson { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("fsconsul.json"), "must contain file path, got: {msg}");
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("fsconsul.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_config_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseYaml { .. }), "got: {err}");
    assert!(err.to_string().contains("fsconsul.yaml"));
}

#[test]
fn load_wrong_shape_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("fsconsul.json");
    file.write_str(r#"["this is a list, not a mapping"]"#).expect("write");

    let err = config::load_config_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseJson { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Validation
// ---------------------------------------------------------------------------

#[test]
fn empty_mapping_list_is_rejected() {
    let err = config::parse_json(r#"{"mappings": []}"#).unwrap_err();
    assert!(matches!(err, ConfigError::NoMappings));

    let err = config::parse_json(r#"{"consul": {"addr": "localhost:8500"}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::NoMappings));
}

#[test]
fn empty_prefix_reports_mapping_index() {
    let err = config::parse_json(
        r#"{"mappings": [
            {"prefix": "ok", "path": "/tmp/a"},
            {"prefix": "/", "path": "/tmp/b"}
        ]}"#,
    )
    .unwrap_err();
    match err {
        ConfigError::InvalidMapping { index, source } => {
            assert_eq!(index, 1);
            assert_eq!(source, MappingError::EmptyPrefix);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_path_is_rejected() {
    let err = config::parse_json(r#"{"mappings": [{"prefix": "gotest"}]}"#).unwrap_err();
    assert!(
        matches!(
            err,
            ConfigError::InvalidMapping {
                index: 0,
                source: MappingError::EmptyTargetDirectory
            }
        ),
        "got: {err}"
    );
    assert!(err.to_string().contains("mapping #0"));
}

#[test]
fn missing_prefix_field_is_structural_error() {
    let err = config::parse_json(r#"{"mappings": [{"path": "/tmp/x"}]}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)), "got: {err}");
}

// ---------------------------------------------------------------------------
// 3. Successful loads
// ---------------------------------------------------------------------------

#[test]
fn yaml_config_with_descriptive_names_loads() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("fsconsul.yml");
    file.write_str(
        "store:\n  address: consul.internal:8500\n  datacenter: dc1\n  token: abc\n\
         mappings:\n  - source_prefix: app/config\n    target_directory: /etc/app\n    on_change_command: systemctl reload app\n",
    )
    .expect("write");

    let config = config::load_config_at(file.path()).expect("load");
    assert_eq!(config.connection.address, "consul.internal:8500");
    assert_eq!(config.connection.datacenter, "dc1");
    assert_eq!(config.connection.auth_token, "abc");
    assert_eq!(config.mappings[0].source_prefix().as_str(), "app/config");
    assert_eq!(
        config.mappings[0].target_directory().to_str(),
        Some("/etc/app/")
    );
    assert_eq!(
        config.mappings[0].on_change_command(),
        Some("systemctl reload app")
    );
}

#[test]
fn quoted_shell_path_is_stripped_on_load() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("fsconsul.json");
    file.write_str(
        r#"{"consul": {"addr": "127.0.0.1:8500", "dc": "dc1"},
            "mappings": [{"prefix": "simple_file", "path": "/srv/conf/\""}]}"#,
    )
    .expect("write");
    file.assert(predicate::path::exists());

    let config = config::load_config_at(file.path()).expect("load");
    let target = config.mappings[0].target_directory().to_string_lossy().into_owned();
    assert_eq!(target, "/srv/conf/");
    assert!(!target.ends_with('"'));
}

#[test]
fn mappings_keep_configured_order() {
    let config = config::parse_json(
        r#"{"mappings": [
            {"prefix": "b", "path": "/tmp/b"},
            {"prefix": "a", "path": "/tmp/a"},
            {"prefix": "c", "path": "/tmp/c"}
        ]}"#,
    )
    .expect("parse");
    let prefixes: Vec<&str> = config
        .mappings
        .iter()
        .map(|m| m.source_prefix().as_str())
        .collect();
    assert_eq!(prefixes, ["b", "a", "c"]);
}
