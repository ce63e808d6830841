use ci_harvest::load_config::{load_config, BASE_URL_ENV, STATE_DIR_ENV};
use ci_harvest_core::config::{DEFAULT_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_SECS};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

fn clear_overrides() {
    env::remove_var(BASE_URL_ENV);
    env::remove_var(STATE_DIR_ENV);
}

#[test]
#[serial]
fn full_config_loads_every_field() {
    clear_overrides();
    let file = config_file(
        r#"
base_url: "https://ci.viaversion.com/"
state_dir: ./tmp/state
concurrency: 16
request_timeout_secs: 10
projects:
  - ViaVersion
  - ViaBackwards
export_path: ./tmp/builds.json
"#,
    );

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.root_url(), "https://ci.viaversion.com");
    assert_eq!(config.state_dir, PathBuf::from("./tmp/state"));
    assert_eq!(config.concurrency, 16);
    assert_eq!(config.request_timeout_secs, 10);
    assert_eq!(config.projects, vec!["ViaVersion", "ViaBackwards"]);
    assert_eq!(config.export_path, Some(PathBuf::from("./tmp/builds.json")));
}

#[test]
#[serial]
fn optional_fields_take_defaults() {
    clear_overrides();
    let file = config_file("base_url: https://ci.example.com\nstate_dir: state\n");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert!(config.projects.is_empty());
    assert!(config.export_path.is_none());
}

#[test]
#[serial]
fn environment_overrides_base_url_and_state_dir() {
    let file = config_file("base_url: https://ci.example.com\nstate_dir: state\n");
    env::set_var(BASE_URL_ENV, "https://ci.internal.example");
    env::set_var(STATE_DIR_ENV, "/var/lib/ci-harvest");

    let config = load_config(file.path());
    clear_overrides();
    let config = config.expect("Config should load");

    assert_eq!(config.base_url, "https://ci.internal.example");
    assert_eq!(config.state_dir, PathBuf::from("/var/lib/ci-harvest"));
}

#[test]
#[serial]
fn zero_concurrency_is_rejected() {
    clear_overrides();
    let file = config_file("base_url: https://ci.example.com\nstate_dir: state\nconcurrency: 0\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(
        format!("{err:#}").contains("concurrency"),
        "Validation error expected, got: {err:#}"
    );
}

#[test]
#[serial]
fn invalid_yaml_reports_parse_error() {
    clear_overrides();
    let file = config_file("not-yaml: [:::");

    let err = load_config(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn missing_base_url_is_a_parse_error() {
    clear_overrides();
    let file = config_file("state_dir: state\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("base_url"), "got: {err}");
}
