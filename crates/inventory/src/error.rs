//! 인벤토리 에러 타입
//!
//! `From<InventoryError> for InvcollectError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use invcollect_core::error::{ConfigError, InvcollectError, SerializeError};

/// 인벤토리 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// `start_entity` 전에 속성 추가
    #[error("no current entity: call start_entity before adding properties")]
    NoCurrentEntity,

    /// 잘못된 엔티티 이름
    #[error("invalid entity name '{name}': {reason}")]
    InvalidEntityName { name: String, reason: String },

    /// 잘못된 속성 경로
    #[error("invalid property key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// XML 생성/파싱 실패
    #[error("xml error: {0}")]
    Xml(String),

    /// 버전 등 설정 값 오류
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 파일 I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for InventoryError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<InventoryError> for InvcollectError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NoCurrentEntity => {
                InvcollectError::Serialize(SerializeError::NoCurrentEntity)
            }
            InventoryError::Config(e) => InvcollectError::Config(e),
            InventoryError::Io(e) => InvcollectError::Io(e),
            other => InvcollectError::Serialize(SerializeError::Failed(other.to_string())),
        }
    }
}
