//! 인벤토리 봉투
//!
//! 직렬화 조각의 최상위 자식(엔티티)을 새 `<Inventory>` 루트로 옮기고 메타데이터를
//! 붙입니다.
//!
//! ```xml
//! <Inventory xmlns=".../data/9.0" Version="9.0.1" Agent="invcollect" Timestamp="2024-05-01T08:00:00.000Z">
//!   <Device xmlns=".../data/9.0/LogInfo" ClearMissingCustomProperties="false">...</Device>
//! </Inventory>
//! ```

use chrono::{DateTime, Utc};

use crate::error::InventoryError;
use crate::serializer::data_namespace;
use crate::xml::XmlElement;

/// 봉투 루트 요소 이름
pub const ROOT_ELEMENT: &str = "Inventory";
/// 최상위 엔티티 요소마다 붙는 속성
pub const CLEAR_MISSING_ATTRIBUTE: &str = "ClearMissingCustomProperties";
/// `Timestamp` 형식 (UTC, 밀리초, `Z`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// 현재 시각으로 봉투를 씌웁니다.
pub fn wrap(fragment: &str, version: &str, agent: &str) -> Result<String, InventoryError> {
    wrap_at(fragment, version, agent, Utc::now())
}

/// 지정한 시각으로 봉투를 씌웁니다 (XML 선언 없음).
pub fn wrap_at(
    fragment: &str,
    version: &str,
    agent: &str,
    timestamp: DateTime<Utc>,
) -> Result<String, InventoryError> {
    envelope(fragment, version, agent, timestamp)?.render(false)
}

/// 봉투 요소 트리를 만듭니다.
pub fn envelope(
    fragment: &str,
    version: &str,
    agent: &str,
    timestamp: DateTime<Utc>,
) -> Result<XmlElement, InventoryError> {
    if version.trim().is_empty() {
        return Err(InventoryError::Xml("envelope version must not be empty".to_owned()));
    }
    if agent.trim().is_empty() {
        return Err(InventoryError::Xml("envelope agent must not be empty".to_owned()));
    }

    let source = XmlElement::parse(fragment)?;

    let mut root = XmlElement::new(ROOT_ELEMENT);
    root.set_attribute("xmlns", data_namespace(version)?);
    root.set_attribute("Version", version.trim());
    root.set_attribute("Agent", agent.trim());
    root.set_attribute("Timestamp", format_timestamp(timestamp));

    for mut child in source.children {
        child.set_attribute(CLEAR_MISSING_ATTRIBUTE, "false");
        root.push(child);
    }
    Ok(root)
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
