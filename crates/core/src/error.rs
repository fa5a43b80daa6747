//! 에러 타입: 도메인별 에러 정의
//!
//! [`InvcollectError`]는 모든 크레이트가 `?`로 전파할 수 있는 최상위 에러입니다.
//! 도메인 크레이트(`invcollect-inventory`, `invcollect-http`)는 자체 에러를
//! `From` 구현으로 이 타입에 연결합니다.

/// invcollect 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum InvcollectError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 실행 파라미터 디코딩 에러
    #[error("parameter error: {0}")]
    Param(#[from] ParamError),

    /// 인벤토리 직렬화 에러
    #[error("serialization error: {0}")]
    Serialize(#[from] SerializeError),

    /// HTTP 계층의 로컬 에러 (HTTP 응답 실패는 에러가 아니라 결과 데이터)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 필수 설정 누락
    #[error("required setting '{name}' is missing or blank")]
    MissingRequired { name: String },
}

/// 실행 파라미터(전송 인코딩) 에러
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// Base64 디코딩 실패
    #[error("invalid base64 payload for '{key}': {reason}")]
    InvalidEncoding { key: String, reason: String },

    /// `key,value` 쌍 형식 오류
    #[error("malformed parameter pair: '{pair}'")]
    MalformedPair { pair: String },

    /// `@{k=v; ...}` 맵 리터럴 형식 오류
    #[error("malformed parameter map: {0}")]
    MalformedMap(String),
}

/// 직렬화 에러
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// 엔티티 없이 속성 추가 시도
    #[error("no current entity: call start_entity before adding properties")]
    NoCurrentEntity,

    /// 잘못된 속성 경로 / XML 생성 실패
    #[error("{0}")]
    Failed(String),
}

/// HTTP 계층 로컬 에러
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 프록시 설정 오류
    #[error("proxy error: {0}")]
    Proxy(String),

    /// 요청 구성 실패 (잘못된 URL, 헤더 등)
    #[error("request error: {0}")]
    Request(String),
}
