//! 설정 통합 테스트
//!
//! - invcollect.toml.example 파싱
//! - 환경변수 우선순위
//! - 실행 파라미터 블롭 → 설정 파일 → 기본값 해석

use std::fs;

use invcollect_core::config::AgentConfig;
use invcollect_core::effective::{SettingDefaults, SettingSource, resolve_effective_config};
use invcollect_core::error::{ConfigError, InvcollectError};
use invcollect_core::params::{decode_params, encode_params};
use serial_test::serial;

// =============================================================================
// invcollect.toml.example
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let content = include_str!("../../../invcollect.toml.example");
    let config = AgentConfig::parse(content).expect("example config should parse");
    config.validate().expect("example config should validate");
    assert_eq!(config, AgentConfig::default());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invcollect.toml");
    fs::write(&path, "[general]\nlog_format = \"pretty\"\n").unwrap();

    // SAFETY: #[serial]로 환경변수를 만지는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("INVCOLLECT_GENERAL_LOG_FORMAT", "json") };
    let config = AgentConfig::load(&path).unwrap();
    unsafe { std::env::remove_var("INVCOLLECT_GENERAL_LOG_FORMAT") };

    assert_eq!(config.general.log_format, "json");
}

#[test]
#[serial]
fn invalid_values_fail_validation_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invcollect.toml");
    fs::write(&path, "[general]\nlog_format = \"xml\"\n").unwrap();

    let err = AgentConfig::load(&path).unwrap_err();
    assert!(matches!(
        err,
        InvcollectError::Config(ConfigError::InvalidValue { .. })
    ));
}

// =============================================================================
// 실행 설정 해석
// =============================================================================

fn write_settings(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("settings.xml");
    fs::write(
        &path,
        format!(
            "<?xml version=\"1.0\"?>\n<configuration><invcollect><settings>{body}</settings></invcollect></configuration>"
        ),
    )
    .unwrap();
    path
}

#[test]
fn blob_parameters_beat_settings_file_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(
        dir.path(),
        r#"<add key="apiUrl" value="https://file.example.com" />
           <add key="pageLimit" value="10" />
           <add key="proxyActive" value="yes" />"#,
    );

    let blob = encode_params([
        ("dataDir", "/srv/out"),
        ("version", "9.0.1"),
        ("params", "@{apiUrl='https://param.example.com'}"),
    ]);
    let params = decode_params(&blob).unwrap();
    let config = resolve_effective_config(&params, Some(&settings), &SettingDefaults::new()).unwrap();

    assert_eq!(config.api_url.as_deref(), Some("https://param.example.com"));
    assert_eq!(config.sources["apiUrl"], SettingSource::Parameter);
    assert_eq!(config.page_limit, 10);
    assert_eq!(config.sources["pageLimit"], SettingSource::File);
    assert_eq!(config.timeout_seconds, 100);
    assert_eq!(config.sources["timeoutSeconds"], SettingSource::Default);
    assert!(config.proxy.active);
    assert!(config.proxy.use_default_credentials);
}

#[test]
fn malformed_settings_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.xml");
    fs::write(&path, "<configuration><invcollect><settings>").unwrap();

    let params = decode_params("dataDir,/srv/out#version,9.0.1").unwrap();
    let config = resolve_effective_config(&params, Some(&path), &SettingDefaults::new()).unwrap();
    assert_eq!(config.entity_name, "Device");
}

#[test]
fn missing_required_setting_aborts_resolution() {
    let params = decode_params("version,9.0.1").unwrap();
    let err = resolve_effective_config(&params, None, &SettingDefaults::new()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRequired { ref name } if name == "dataDir"));
}
