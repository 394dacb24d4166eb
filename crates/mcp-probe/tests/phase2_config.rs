//! Phase 2: Configuration tests, defaults, TOML loading, overrides, validation.

use std::path::PathBuf;
use std::time::Duration;

use mcp_probe::config::{
    load_config, parse_env_pair, resolve_config_path, ConfigOverrides, ProbeConfig,
};
use mcp_probe::protocol::{ReadMode, ScenarioKind};
use mcp_probe::types::{ProbeError, MCP_VERSION};

#[test]
fn test_defaults() {
    let config = ProbeConfig::default();
    assert!(config.server.command.is_none());
    assert_eq!(config.probe.scenario, ScenarioKind::Handshake);
    assert_eq!(config.probe.read_mode, ReadMode::Interactive);
    assert_eq!(config.timeout(), Duration::from_secs(15));
    assert_eq!(config.settle_delay(), Duration::from_millis(2000));
    assert_eq!(config.message_delay(), Duration::ZERO);
    assert_eq!(config.probe.keywords, vec!["notebook", "resources"]);
    assert_eq!(config.probe.protocol_version, MCP_VERSION);
    assert_eq!(config.report.path, PathBuf::from("probe_report.txt"));
}

#[test]
fn test_load_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp-probe.toml");
    std::fs::write(
        &path,
        r#"
[server]
command = "python"
args = ["-m", "notebooklm_mcp.server"]
env = { PYTHONUNBUFFERED = "1" }

[probe]
scenario = "legacy-list"
read_mode = "batch"
timeout_secs = 10
settle_ms = 1500
message_delay_ms = 1000
keywords = ["notebook"]

[report]
path = "out/verify_result.txt"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.server.command.as_deref(), Some("python"));
    assert_eq!(config.server.args, vec!["-m", "notebooklm_mcp.server"]);
    assert_eq!(
        config.server.env.get("PYTHONUNBUFFERED").map(String::as_str),
        Some("1")
    );
    assert_eq!(config.probe.scenario, ScenarioKind::LegacyList);
    assert_eq!(config.probe.read_mode, ReadMode::Batch);
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert_eq!(config.settle_delay(), Duration::from_millis(1500));
    assert_eq!(config.message_delay(), Duration::from_secs(1));
    assert_eq!(config.probe.keywords, vec!["notebook"]);
    assert_eq!(config.report.path, PathBuf::from("out/verify_result.txt"));
}

#[test]
fn test_partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[server]\ncommand = \"my-server\"\n").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.server.command.as_deref(), Some("my-server"));
    assert!(config.server.args.is_empty());
    assert_eq!(config.probe.timeout_secs, 15);
    assert_eq!(config.probe.client_name, "mcp-probe");
}

#[test]
fn test_invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[probe]\ntimeout_secs = \"soon\"\n").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ProbeError::TomlParse(_)));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ProbeError::Config(_)));
}

#[test]
fn test_overrides_replace_command_and_flags() {
    let mut config = ProbeConfig::default();
    config.server.command = Some("old".to_string());
    config.server.args = vec!["--old".to_string()];

    ConfigOverrides {
        command: vec!["new-server".to_string(), "--stdio".to_string()],
        env: vec![("DEBUG".to_string(), "1".to_string())],
        scenario: Some(ScenarioKind::LegacyList),
        read_mode: Some(ReadMode::Batch),
        timeout_secs: Some(3),
        settle_ms: Some(0),
        message_delay_ms: Some(250),
        keywords: vec!["notebook".to_string()],
        report_path: Some(PathBuf::from("r.txt")),
        ..ConfigOverrides::default()
    }
    .apply(&mut config);

    assert_eq!(config.server.command.as_deref(), Some("new-server"));
    assert_eq!(config.server.args, vec!["--stdio"]);
    assert_eq!(config.server.env.get("DEBUG").map(String::as_str), Some("1"));
    assert_eq!(config.probe.scenario, ScenarioKind::LegacyList);
    assert_eq!(config.probe.read_mode, ReadMode::Batch);
    assert_eq!(config.probe.timeout_secs, 3);
    assert_eq!(config.probe.settle_ms, 0);
    assert_eq!(config.message_delay(), Duration::from_millis(250));
    assert_eq!(config.probe.keywords, vec!["notebook"]);
    assert_eq!(config.report.path, PathBuf::from("r.txt"));
}

#[test]
fn test_empty_overrides_change_nothing() {
    let mut config = ProbeConfig::default();
    config.server.command = Some("server".to_string());
    config.server.args = vec!["--flag".to_string()];

    ConfigOverrides::default().apply(&mut config);

    assert_eq!(config.server.command.as_deref(), Some("server"));
    assert_eq!(config.server.args, vec!["--flag"]);
    assert_eq!(config.probe.keywords, vec!["notebook", "resources"]);
}

#[test]
fn test_validate_requires_command() {
    let config = ProbeConfig::default();
    assert!(matches!(config.validate(), Err(ProbeError::Config(_))));

    let mut config = ProbeConfig::default();
    config.server.command = Some("   ".to_string());
    assert!(config.validate().is_err());

    config.server.command = Some("server".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_timeout_and_blank_keywords() {
    let mut config = ProbeConfig::default();
    config.server.command = Some("server".to_string());

    config.probe.timeout_secs = 0;
    assert!(config.validate().is_err());

    config.probe.timeout_secs = 5;
    config.probe.keywords = vec![" ".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_rendered_config_loads_back() {
    let mut config = ProbeConfig::default();
    config.server.command = Some("python".to_string());
    config.server.args = vec!["-m".to_string(), "server".to_string()];
    config
        .server
        .env
        .insert("TOKEN".to_string(), "abc".to_string());

    let rendered = config.to_toml_string().unwrap();
    assert!(rendered.contains("[server]"));
    assert!(rendered.contains("read_mode = \"interactive\""));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rendered.toml");
    std::fs::write(&path, rendered).unwrap();
    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded.server.command.as_deref(), Some("python"));
    assert_eq!(loaded.server.env.get("TOKEN").map(String::as_str), Some("abc"));
}

#[test]
fn test_parse_env_pair() {
    assert_eq!(
        parse_env_pair("KEY=value").unwrap(),
        ("KEY".to_string(), "value".to_string())
    );
    assert_eq!(
        parse_env_pair("URL=http://x?a=b").unwrap(),
        ("URL".to_string(), "http://x?a=b".to_string())
    );
    assert_eq!(
        parse_env_pair("EMPTY=").unwrap(),
        ("EMPTY".to_string(), String::new())
    );
    assert!(parse_env_pair("novalue").is_err());
    assert!(parse_env_pair("=value").is_err());
}

#[test]
fn test_explicit_config_path_wins() {
    let resolved = resolve_config_path(Some("custom.toml"));
    assert_eq!(resolved, Some(PathBuf::from("custom.toml")));
}
