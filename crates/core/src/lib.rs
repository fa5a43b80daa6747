#![doc = include_str!("../README.md")]

pub mod coerce;
pub mod config;
pub mod effective;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod params;
pub mod settings;
pub mod version;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, InvcollectError, ParamError, SerializeError, TransportError};

// 설정
pub use config::AgentConfig;
pub use effective::{
    EffectiveConfig, ProxyConfig, SettingDefaults, SettingSource, resolve_effective_config,
};
pub use settings::SettingsFile;

// 실행 파라미터
pub use params::{RunParameters, decode_params, encode_params};

// 타입 변환
pub use coerce::{to_bool, try_parse_bool};

// 이벤트
pub use notify::{Category, ItemResult, NotifyEvent, State};
