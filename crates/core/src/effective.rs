//! 실행 설정 해석: 파라미터 / 설정 파일 / 기본값 병합
//!
//! # 우선순위
//! 1. 실행 파라미터 (공백이 아닌 값일 때)
//! 2. 외부 XML 설정 파일 ([`SettingsFile`])
//! 3. 에이전트 설정 파일이 준 기본값 ([`SettingDefaults`])
//! 4. 설정별 기본값 ([`SETTING_SPECS`])
//!
//! 설정 파일 값이 변환에 실패하면 경고만 남기고 기본값으로 넘어갑니다.
//! 실행 파라미터 값의 변환 실패는 에러입니다.
//!
//! 모든 곳에 값이 없으면 값이 없으면 `None`이며, 필수 설정이면 에러입니다.
//! 해석 결과인 [`EffectiveConfig`]는 한 번 만들어진 뒤 변경하지 않습니다.
//!
//! # 사용 예시
//!
//! ```
//! use invcollect_core::effective::EffectiveConfig;
//! use invcollect_core::params::RunParameters;
//! use invcollect_core::settings::SettingsFile;
//!
//! let params: RunParameters = [("dataDir", "/out"), ("version", "9.0.1")]
//!     .into_iter()
//!     .collect();
//! let config = EffectiveConfig::resolve(&params, &SettingsFile::empty()).unwrap();
//! assert_eq!(config.agent_name, "invcollect");
//! assert!(!config.proxy.active);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::coerce::{SettingKind, SettingValue, coerce};
use crate::config::AgentConfig;
use crate::error::ConfigError;
use crate::params::RunParameters;
use crate::settings::SettingsFile;
use crate::version::major_version;

/// 마스킹된 비밀 값 표시
const REDACTED: &str = "***";

/// 설정 값의 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettingSource {
    Parameter,
    File,
    Default,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter => write!(f, "parameter"),
            Self::File => write!(f, "file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// 인식하는 설정 하나의 선언
#[derive(Debug, Clone, Copy)]
pub struct SettingSpec {
    pub name: &'static str,
    pub kind: SettingKind,
    pub default: Option<&'static str>,
    pub required: bool,
    pub secret: bool,
}

const fn spec(name: &'static str, kind: SettingKind, default: Option<&'static str>) -> SettingSpec {
    SettingSpec {
        name,
        kind,
        default,
        required: false,
        secret: false,
    }
}

const fn required(name: &'static str) -> SettingSpec {
    SettingSpec {
        required: true,
        ..spec(name, SettingKind::String, None)
    }
}

const fn secret(name: &'static str) -> SettingSpec {
    SettingSpec {
        secret: true,
        ..spec(name, SettingKind::String, None)
    }
}

/// 인식하는 모든 설정
pub const SETTING_SPECS: &[SettingSpec] = &[
    required("version"),
    required("dataDir"),
    spec("agentName", SettingKind::String, Some("invcollect")),
    spec("entityName", SettingKind::String, Some("Device")),
    spec("apiUrl", SettingKind::String, None),
    secret("apiToken"),
    spec("tenantId", SettingKind::String, None),
    spec("clientId", SettingKind::String, None),
    secret("clientSecret"),
    spec("proxyActive", SettingKind::Bool, Some("false")),
    spec("proxyUrl", SettingKind::String, None),
    spec("proxyUsername", SettingKind::String, None),
    secret("proxyPassword"),
    spec("proxyUseDefaultCredentials", SettingKind::Bool, None),
    spec("proxyBypassOnLocal", SettingKind::Bool, Some("true")),
    spec("proxyBypassList", SettingKind::String, None),
    spec("debugFile", SettingKind::String, None),
    spec("lastRun", SettingKind::DateTime, None),
    spec("timeoutSeconds", SettingKind::Int, Some("100")),
    spec("pageLimit", SettingKind::Int, Some("50")),
    spec("requestDelaySeconds", SettingKind::Double, Some("0")),
    spec("useDataNamespace", SettingKind::Bool, Some("false")),
];

/// 프록시 설정
///
/// 항상 존재하며 기본값은 비활성입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyConfig {
    pub active: bool,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 명시적 사용자명이 없을 때 환경(기본) 자격 증명 사용
    pub use_default_credentials: bool,
    /// 로컬 주소는 프록시를 거치지 않음
    pub bypass_on_local: bool,
    /// 프록시를 거치지 않을 호스트 목록
    pub bypass_list: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            active: false,
            url: None,
            username: None,
            password: None,
            use_default_credentials: false,
            bypass_on_local: true,
            bypass_list: Vec::new(),
        }
    }
}

/// 해석이 끝난 실행 설정
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub version: String,
    pub data_dir: PathBuf,
    pub agent_name: String,
    pub entity_name: String,
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub proxy: ProxyConfig,
    pub debug_file: Option<PathBuf>,
    pub last_run: Option<DateTime<Utc>>,
    pub timeout_seconds: u64,
    pub page_limit: u32,
    pub request_delay_seconds: f64,
    pub use_data_namespace: bool,
    /// 인식하지 않는 파라미터를 포함한 원본 실행 파라미터
    pub extra: BTreeMap<String, String>,
    /// 설정별 값 출처
    pub sources: BTreeMap<String, SettingSource>,
}

/// 해석된 설정 값 목록
#[derive(Debug, Default)]
struct Resolved {
    values: BTreeMap<&'static str, SettingValue>,
    sources: BTreeMap<String, SettingSource>,
}

impl Resolved {
    fn string(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .and_then(SettingValue::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(SettingValue::as_bool)
    }

    fn int(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(SettingValue::as_int)
    }

    fn double(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(SettingValue::as_double)
    }

    fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.values.get(name).and_then(SettingValue::as_datetime)
    }
}

/// 설정별 기본값 재정의
///
/// 컴파일된 기본값보다 우선하지만 출처는 `SettingSource::Default`로 남습니다.
#[derive(Debug, Clone, Default)]
pub struct SettingDefaults {
    values: BTreeMap<String, String>,
}

impl SettingDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// 에이전트 설정의 `general.agent_name`, `http.timeout_secs`
    pub fn from_agent(agent: &AgentConfig) -> Self {
        let mut defaults = Self::new();
        defaults.set("agentName", agent.general.agent_name.as_str());
        defaults.set("timeoutSeconds", agent.http.timeout_secs.to_string());
        defaults
    }

    /// 공백 값은 무시합니다.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.insert(name.to_owned(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// 설정 하나를 우선순위에 따라 해석합니다.
///
/// # Errors
///
/// - `ConfigError::MissingRequired`: 필수 설정이 어디에도 없음
/// - `ConfigError::InvalidValue`: 파라미터 또는 기본값의 숫자/날짜 변환 실패
pub fn resolve_setting(
    spec: &SettingSpec,
    params: &RunParameters,
    file: &SettingsFile,
    defaults: &SettingDefaults,
) -> Result<Option<(SettingValue, SettingSource)>, ConfigError> {
    if let Some(raw) = params.get_non_blank(spec.name) {
        let value = coerce(spec.name, raw, spec.kind)?;
        return Ok(Some((value, SettingSource::Parameter)));
    }

    if let Some(raw) = file.get(spec.name).filter(|v| !v.trim().is_empty()) {
        match coerce(spec.name, raw, spec.kind) {
            Ok(value) => return Ok(Some((value, SettingSource::File))),
            Err(e) => warn!(
                setting = spec.name,
                error = %e,
                "ignoring invalid settings file value"
            ),
        }
    }

    match defaults.get(spec.name).or(spec.default) {
        Some(raw) => Ok(Some((coerce(spec.name, raw, spec.kind)?, SettingSource::Default))),
        None if spec.required => Err(ConfigError::MissingRequired {
            name: spec.name.to_owned(),
        }),
        None => Ok(None),
    }
}

impl EffectiveConfig {
    /// 실행 파라미터와 이미 읽은 설정 파일로 설정을 해석합니다.
    pub fn resolve(params: &RunParameters, file: &SettingsFile) -> Result<Self, ConfigError> {
        Self::resolve_with_defaults(params, file, &SettingDefaults::default())
    }

    /// [`EffectiveConfig::resolve`]에 기본값 재정의를 더한 버전
    pub fn resolve_with_defaults(
        params: &RunParameters,
        file: &SettingsFile,
        defaults: &SettingDefaults,
    ) -> Result<Self, ConfigError> {
        let mut resolved = Resolved::default();
        for spec in SETTING_SPECS {
            if let Some((value, source)) = resolve_setting(spec, params, file, defaults)? {
                resolved.values.insert(spec.name, value);
                resolved.sources.insert(spec.name.to_owned(), source);
            }
        }

        let version = resolved.string("version").ok_or_else(|| ConfigError::MissingRequired {
            name: "version".to_owned(),
        })?;
        major_version(&version)?;

        let data_dir = resolved.string("dataDir").ok_or_else(|| ConfigError::MissingRequired {
            name: "dataDir".to_owned(),
        })?;

        let proxy = resolve_proxy(&resolved);

        let config = Self {
            version,
            data_dir: PathBuf::from(data_dir),
            agent_name: resolved.string("agentName").unwrap_or_default(),
            entity_name: resolved.string("entityName").unwrap_or_default(),
            api_url: resolved.string("apiUrl"),
            api_token: resolved.string("apiToken"),
            tenant_id: resolved.string("tenantId"),
            client_id: resolved.string("clientId"),
            client_secret: resolved.string("clientSecret"),
            proxy,
            debug_file: resolved.string("debugFile").map(PathBuf::from),
            last_run: resolved.datetime("lastRun"),
            timeout_seconds: positive("timeoutSeconds", resolved.int("timeoutSeconds"))?,
            page_limit: u32::try_from(positive("pageLimit", resolved.int("pageLimit"))?)
                .map_err(|_| ConfigError::InvalidValue {
                    field: "pageLimit".to_owned(),
                    reason: "must fit in 32 bits".to_owned(),
                })?,
            request_delay_seconds: non_negative(
                "requestDelaySeconds",
                resolved.double("requestDelaySeconds"),
            )?,
            use_data_namespace: resolved.bool("useDataNamespace").unwrap_or(false),
            extra: params
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            sources: resolved.sources,
        };

        debug!(
            version = %config.version,
            data_dir = %config.data_dir.display(),
            proxy_active = config.proxy.active,
            "resolved effective config"
        );
        Ok(config)
    }

    /// 비밀 값을 마스킹한 사본을 반환합니다.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_owned());
        let mut copy = self.clone();
        copy.api_token = mask(&self.api_token);
        copy.client_secret = mask(&self.client_secret);
        copy.proxy.password = mask(&self.proxy.password);
        for spec in SETTING_SPECS.iter().filter(|s| s.secret) {
            for (key, value) in copy.extra.iter_mut() {
                if key.eq_ignore_ascii_case(spec.name) {
                    *value = REDACTED.to_owned();
                }
            }
        }
        copy
    }
}

/// 실행 파라미터로 설정을 해석합니다.
///
/// 외부 설정 파일 위치는 `settings_path`가 주어지면 그것을, 아니면 파라미터의
/// `version`으로 정해지는 기본 위치를 사용합니다. 버전별 위치를 찾아야 하므로
/// `version`은 파라미터에 있어야 합니다.
pub fn resolve_effective_config(
    params: &RunParameters,
    settings_path: Option<&Path>,
    defaults: &SettingDefaults,
) -> Result<EffectiveConfig, ConfigError> {
    let path = match settings_path {
        Some(path) => path.to_path_buf(),
        None => {
            let version =
                params
                    .get_non_blank("version")
                    .ok_or_else(|| ConfigError::MissingRequired {
                        name: "version".to_owned(),
                    })?;
            SettingsFile::default_path(version)?
        }
    };

    let file = SettingsFile::load(&path);
    let config = EffectiveConfig::resolve_with_defaults(params, &file, defaults)?;
    info!(
        settings_file = %path.display(),
        file_settings = file.len(),
        "effective config resolved"
    );
    Ok(config)
}

fn resolve_proxy(resolved: &Resolved) -> ProxyConfig {
    let active = resolved.bool("proxyActive").unwrap_or(false);
    let username = resolved.string("proxyUsername");
    let use_default_credentials = resolved
        .bool("proxyUseDefaultCredentials")
        .unwrap_or(active && username.is_none());

    ProxyConfig {
        active,
        url: resolved.string("proxyUrl"),
        username,
        password: resolved.string("proxyPassword"),
        use_default_credentials,
        bypass_on_local: resolved.bool("proxyBypassOnLocal").unwrap_or(true),
        bypass_list: resolved
            .string("proxyBypassList")
            .map(|list| {
                list.split([',', ';'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn positive(field: &str, value: Option<i64>) -> Result<u64, ConfigError> {
    match value {
        Some(v) if v > 0 => Ok(v as u64),
        Some(v) => Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: format!("must be greater than 0, got {v}"),
        }),
        None => Err(ConfigError::MissingRequired {
            name: field.to_owned(),
        }),
    }
}

fn non_negative(field: &str, value: Option<f64>) -> Result<f64, ConfigError> {
    match value {
        Some(v) if v >= 0.0 => Ok(v),
        Some(v) => Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: format!("must not be negative, got {v}"),
        }),
        None => Ok(0.0),
    }
}
