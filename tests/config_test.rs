//! Configuration loading, saving and override tests

use std::path::Path;
use vigil::config::{merge_cli_overrides, AgentConfig, CliOverrides};
use vigil::models::RiskLevel;

#[test]
fn save_and_load_round_trip_preserves_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.yaml");

    let mut config = AgentConfig::default();
    config.navigator.timeout = 12_345;
    config.llm.model = "phi3".to_string();
    config.llm.model_path = "models/phi3.gguf".to_string();
    config.security.risk_threshold = RiskLevel::High;
    config.security.zap_api_key = Some("key".to_string());
    config.agent.max_pages = 7;

    config.save(&path).expect("save");
    let reloaded = AgentConfig::load(&path).expect("load");

    assert_eq!(reloaded, config);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config =
        AgentConfig::load_or_default(Path::new("/nonexistent/settings.yaml")).expect("defaults");
    assert_eq!(config, AgentConfig::default());
}

#[test]
fn missing_file_is_an_error_for_explicit_load() {
    assert!(AgentConfig::load(Path::new("/nonexistent/settings.yaml")).is_err());
}

#[test]
fn malformed_yaml_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.yaml");
    std::fs::write(&path, "navigator: [not, a, mapping]").expect("write");

    assert!(AgentConfig::load(&path).is_err());
}

#[test]
fn unknown_keys_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.yaml");
    std::fs::write(
        &path,
        "navigator:\n  timeout: 9000\n  future_option: true\nextra_section:\n  x: 1\n",
    )
    .expect("write");

    let config = AgentConfig::load(&path).expect("load");
    assert_eq!(config.navigator.timeout, 9000);
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/deeper/settings.yaml");

    AgentConfig::default().save(&path).expect("save");
    assert!(path.exists());
}

#[test]
fn risk_threshold_round_trips_as_lowercase() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.yaml");

    let mut config = AgentConfig::default();
    config.security.risk_threshold = RiskLevel::High;
    config.save(&path).expect("save");

    let raw = std::fs::read_to_string(&path).expect("read");
    assert!(raw.contains("risk_threshold: high"));

    let reloaded = AgentConfig::load(&path).expect("load");
    assert_eq!(reloaded.security.risk_threshold, RiskLevel::High);
}

#[test]
fn cli_overrides_beat_file_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.yaml");
    std::fs::write(
        &path,
        "agent:\n  max_depth: 5\nsecurity:\n  risk_threshold: low\n",
    )
    .expect("write");

    let mut config = AgentConfig::load(&path).expect("load");
    merge_cli_overrides(
        &mut config,
        CliOverrides {
            max_depth: Some(1),
            risk_threshold: Some(RiskLevel::High),
            ..CliOverrides::default()
        },
    );

    assert_eq!(config.agent.max_depth, 1);
    assert_eq!(config.security.risk_threshold, RiskLevel::High);
}
