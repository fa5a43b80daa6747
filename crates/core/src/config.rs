//! 에이전트 설정: invcollect.toml 파싱 및 환경변수 오버라이드
//!
//! [`AgentConfig`]는 수집기 프로세스 자체의 동작(로그, HTTP 재시도, 설정 파일
//! 위치)을 담습니다. 수집 대상별 실행 설정은 [`crate::effective`]가 해석합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`INVCOLLECT_HTTP_MAX_ATTEMPTS=5` 형식)
//! 3. 설정 파일 (`invcollect.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```
//! use invcollect_core::config::AgentConfig;
//!
//! let config = AgentConfig::parse("[http]\nmax_attempts = 5").unwrap();
//! assert_eq!(config.http.max_attempts, 5);
//! assert_eq!(config.general.log_level, "info");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, InvcollectError};

/// invcollect 에이전트 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// HTTP 재시도/타임아웃 설정
    #[serde(default)]
    pub http: HttpConfig,
    /// 외부 XML 설정 파일 위치
    #[serde(default)]
    pub settings: SettingsConfig,
}

impl AgentConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InvcollectError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작합니다. 환경변수 오버라이드는 항상 적용됩니다.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, InvcollectError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path) {
            Ok(config) => config,
            Err(InvcollectError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "agent config not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InvcollectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InvcollectError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                InvcollectError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, InvcollectError> {
        toml::from_str(toml_str).map_err(|e| {
            InvcollectError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `INVCOLLECT_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "INVCOLLECT_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "INVCOLLECT_GENERAL_LOG_FORMAT",
        );
        override_string(
            &mut self.general.agent_name,
            "INVCOLLECT_GENERAL_AGENT_NAME",
        );

        // HTTP
        override_u32(&mut self.http.max_attempts, "INVCOLLECT_HTTP_MAX_ATTEMPTS");
        override_u64(
            &mut self.http.backoff_base_ms,
            "INVCOLLECT_HTTP_BACKOFF_BASE_MS",
        );
        override_u64(&mut self.http.max_jitter_ms, "INVCOLLECT_HTTP_MAX_JITTER_MS");
        override_u64(&mut self.http.timeout_secs, "INVCOLLECT_HTTP_TIMEOUT_SECS");
        override_string(&mut self.http.debug_file, "INVCOLLECT_HTTP_DEBUG_FILE");

        // Settings
        override_string(&mut self.settings.path, "INVCOLLECT_SETTINGS_PATH");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), InvcollectError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.general.agent_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.agent_name".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.http.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.max_attempts".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 실행 파라미터에 agentName이 없을 때 사용할 에이전트 이름
    pub agent_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            agent_name: "invcollect".to_owned(),
        }
    }
}

/// HTTP 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 지수 백오프 기준 지연 (밀리초)
    pub backoff_base_ms: u64,
    /// 재시도 지연에 더해지는 최대 지터 (밀리초)
    pub max_jitter_ms: u64,
    /// 실행 설정에 timeoutSeconds가 없을 때의 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 실행 설정에 debugFile이 없을 때의 디버그 로그 경로 (빈 문자열이면 비활성)
    pub debug_file: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 400,
            max_jitter_ms: 150,
            timeout_secs: 100,
            debug_file: String::new(),
        }
    }
}

/// 외부 XML 설정 파일 위치
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// 설정 파일 경로 (빈 문자열이면 버전별 기본 위치)
    pub path: String,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = AgentConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.general.agent_name, "invcollect");
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.http.backoff_base_ms, 400);
        assert_eq!(config.http.max_jitter_ms, 150);
        assert!(config.settings.path.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        AgentConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = AgentConfig::parse("").unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let config = AgentConfig::parse(
            r#"
[general]
log_level = "debug"

[http]
timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.max_attempts, 3);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = AgentConfig::parse("[general\nlog_level = ").unwrap_err();
        assert!(matches!(
            err,
            InvcollectError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = AgentConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = AgentConfig::default();
        config.http.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    #[serial]
    fn env_override_applies_to_sections() {
        // SAFETY: #[serial]로 환경변수를 만지는 테스트를 직렬화합니다.
        unsafe {
            std::env::set_var("INVCOLLECT_HTTP_MAX_ATTEMPTS", "5");
            std::env::set_var("INVCOLLECT_SETTINGS_PATH", "/tmp/settings.xml");
        }
        let mut config = AgentConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.http.max_attempts, 5);
        assert_eq!(config.settings.path, "/tmp/settings.xml");
        unsafe {
            std::env::remove_var("INVCOLLECT_HTTP_MAX_ATTEMPTS");
            std::env::remove_var("INVCOLLECT_SETTINGS_PATH");
        }
    }

    #[test]
    #[serial]
    fn env_override_invalid_number_keeps_original() {
        // SAFETY: #[serial]로 환경변수를 만지는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("INVCOLLECT_HTTP_TIMEOUT_SECS", "forever") };
        let mut config = AgentConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.http.timeout_secs, 100);
        unsafe { std::env::remove_var("INVCOLLECT_HTTP_TIMEOUT_SECS") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_INVCOLLECT_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = AgentConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = AgentConfig::parse(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn from_file_not_found() {
        let err = AgentConfig::from_file("/nonexistent/path/invcollect.toml").unwrap_err();
        assert!(matches!(
            err,
            InvcollectError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    #[serial]
    fn load_or_default_without_file() {
        let config = AgentConfig::load_or_default("/nonexistent/path/invcollect.toml").unwrap();
        assert_eq!(config.http.max_attempts, 3);
    }
}
