//! 엔티티 목록 → XML 직렬화
//!
//! # 하위 그룹 규칙
//!
//! 엔티티마다 속성을 입력 순서대로 처리합니다.
//!
//! - 세그먼트가 하나인 키는 엔티티의 직접 자식이 되며, 열린 하위 그룹을 닫습니다.
//! - 여러 세그먼트 키는 첫 세그먼트 이름의 하위 그룹에 들어갑니다. 열린 그룹과
//!   이름이 다르거나, 열린 그룹 안에 같은 리프 이름이 이미 있으면 새 그룹
//!   인스턴스를 엽니다.
//!
//! 따라서 `SoftwarePackage.Name=A`, `SoftwarePackage.Name=B`는 두 개의
//! `SoftwarePackage` 요소가 됩니다.

use std::collections::HashSet;

use invcollect_core::version::major_version;
use tracing::debug;

use crate::entity::{Entity, PropertyEntry};
use crate::error::InventoryError;
use crate::property::{PropertyKey, compose_key, is_xml_name};
use crate::xml::{XmlElement, strip_invalid_chars};

/// 인벤토리 네임스페이스 기준 URL
pub const NAMESPACE_BASE: &str = "http://schemas.invcollect.io/inventory/data";
/// 로그 정보 네임스페이스 접미어
pub const LOG_INFO_SUFFIX: &str = "/LogInfo";
/// 직렬화 조각의 루트 요소 이름
pub const FRAGMENT_ROOT: &str = "Entities";

/// 데이터 네임스페이스 (`.../data/{major}.0`)
pub fn data_namespace(version: &str) -> Result<String, InventoryError> {
    let major = major_version(version)?;
    Ok(format!("{NAMESPACE_BASE}/{major}.0"))
}

/// 엔티티 요소의 네임스페이스
///
/// `use_data_namespace`가 아니면 `/LogInfo` 접미어가 붙습니다.
pub fn entity_namespace(version: &str, use_data_namespace: bool) -> Result<String, InventoryError> {
    let mut namespace = data_namespace(version)?;
    if !use_data_namespace {
        namespace.push_str(LOG_INFO_SUFFIX);
    }
    Ok(namespace)
}

/// 엔티티 목록을 들여쓰기된 XML 조각으로 직렬화합니다 (XML 선언 없음).
///
/// 루트는 `<Entities>`이며 자식이 엔티티 요소입니다.
pub fn serialize(
    entities: &[Entity],
    version: &str,
    use_data_namespace: bool,
) -> Result<String, InventoryError> {
    let namespace = entity_namespace(version, use_data_namespace)?;
    let mut root = XmlElement::new(FRAGMENT_ROOT);
    for entity in entities {
        root.push(entity_element(entity, &namespace)?);
    }
    debug!(entity_count = entities.len(), "serialized entities");
    root.render(false)
}

/// 엔티티 하나를 XML 요소로 변환합니다.
pub fn entity_element(entity: &Entity, namespace: &str) -> Result<XmlElement, InventoryError> {
    if !is_xml_name(entity.name()) {
        return Err(InventoryError::InvalidEntityName {
            name: entity.name().to_owned(),
            reason: "not a valid element name".to_owned(),
        });
    }

    let mut element = XmlElement::new(entity.name());
    element.set_attribute("xmlns", namespace);

    let mut open: Option<OpenGroup> = None;
    for entry in entity.entries() {
        let key = PropertyKey::parse(&entry.key)?;
        let leaf = XmlElement::new(key.leaf())
            .with_attributes(key.attributes())
            .with_text(strip_invalid_chars(&entry.value).trim());

        match key.group() {
            None => {
                if let Some(group) = open.take() {
                    element.push(group.element);
                }
                element.push(leaf);
            }
            Some(name) => {
                let reopen = open
                    .as_ref()
                    .is_none_or(|g| g.element.name != name || g.leaves.contains(key.leaf()));
                if reopen {
                    if let Some(group) = open.take() {
                        element.push(group.element);
                    }
                    open = Some(OpenGroup::new(name));
                }
                if let Some(group) = open.as_mut() {
                    group.leaves.insert(key.leaf().to_owned());
                    group.element.push(leaf);
                }
            }
        }
    }
    if let Some(group) = open.take() {
        element.push(group.element);
    }

    Ok(element)
}

struct OpenGroup {
    element: XmlElement,
    leaves: HashSet<String>,
}

impl OpenGroup {
    fn new(name: &str) -> Self {
        Self {
            element: XmlElement::new(name),
            leaves: HashSet::new(),
        }
    }
}

/// 직렬화된 문서(조각 또는 봉투)에서 엔티티 목록을 다시 읽습니다.
///
/// 루트의 자식 요소가 엔티티이며, 자식 요소를 가진 속성 요소는 하위 그룹으로
/// 해석합니다. `xmlns`와 `ClearMissingCustomProperties` 속성은 무시합니다.
pub fn read_entities(xml: &str) -> Result<Vec<Entity>, InventoryError> {
    let root = XmlElement::parse(xml)?;
    let entities = root
        .children
        .iter()
        .map(|element| {
            let mut entity = Entity::new(element.name.as_str());
            for child in &element.children {
                if child.children.is_empty() {
                    push_entry(&mut entity, leaf_entry(None, child));
                } else {
                    for leaf in &child.children {
                        push_entry(&mut entity, leaf_entry(Some(&child.name), leaf));
                    }
                }
            }
            entity
        })
        .collect();
    Ok(entities)
}

fn push_entry(entity: &mut Entity, entry: PropertyEntry) {
    entity.push(entry.key, entry.value);
}

fn leaf_entry(group: Option<&str>, leaf: &XmlElement) -> PropertyEntry {
    PropertyEntry {
        key: compose_key(group, &leaf.name, &leaf.attributes),
        value: leaf.text.clone().unwrap_or_default(),
    }
}
