//! 엔티티 누적기
//!
//! [`EntityAccumulator`]는 한 번의 수집 실행 동안 엔티티(출력 행) 목록을
//! 입력 순서대로 모읍니다. 전역 상태가 아니라 호출 체인을 따라 `&mut`로
//! 전달되는 값이며, [`crate::writer::InventoryWriter`]가 파일로 기록한 뒤
//! 비웁니다.
//!
//! # 사용 예시
//!
//! ```
//! use invcollect_inventory::EntityAccumulator;
//!
//! let mut acc = EntityAccumulator::new();
//! acc.start_entity("Device");
//! acc.add_property("Name", "PC1").unwrap();
//! acc.add_property("OperatingSystem.Name", "Windows 11").unwrap();
//! assert_eq!(acc.len(), 1);
//! ```

use std::fmt;

use crate::error::InventoryError;

/// 값을 알 수 없는 속성에 기록하는 기본값
pub const DEFAULT_VALUE: &str = "-";

/// 속성 한 줄 (`dotted.key{attr:val} = value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
}

impl fmt::Display for PropertyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)
    }
}

/// 출력 레코드 하나 (예: Device 한 대)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    entries: Vec<PropertyEntry>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 입력 순서대로의 속성 목록
    pub fn entries(&self) -> &[PropertyEntry] {
        &self.entries
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(PropertyEntry {
            key: key.into(),
            value: value.into(),
        });
    }
}

/// 엔티티 누적기
#[derive(Debug, Default)]
pub struct EntityAccumulator {
    entities: Vec<Entity>,
}

impl EntityAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 엔티티를 시작합니다. 이후 속성은 이 엔티티에 추가됩니다.
    pub fn start_entity(&mut self, name: impl Into<String>) {
        self.entities.push(Entity::new(name));
    }

    /// 현재 엔티티에 속성을 추가합니다.
    ///
    /// # Errors
    ///
    /// `start_entity`를 한 번도 호출하지 않았으면 `InventoryError::NoCurrentEntity`
    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), InventoryError> {
        let entity = self
            .entities
            .last_mut()
            .ok_or(InventoryError::NoCurrentEntity)?;
        entity.push(name, value);
        Ok(())
    }

    /// 기본값 `-`로 속성을 추가합니다.
    pub fn add_property_default(&mut self, name: impl Into<String>) -> Result<(), InventoryError> {
        self.add_property(name, DEFAULT_VALUE)
    }

    /// 값이 없으면 `-`를 기록합니다.
    pub fn add_optional<T: fmt::Display>(
        &mut self,
        name: impl Into<String>,
        value: Option<T>,
    ) -> Result<(), InventoryError> {
        match value {
            Some(v) => self.add_property(name, v.to_string()),
            None => self.add_property_default(name),
        }
    }

    /// 현재(마지막으로 시작한) 엔티티
    pub fn current(&self) -> Option<&Entity> {
        self.entities.last()
    }

    /// 현재 엔티티를 버립니다. 레코드 처리 도중 실패했을 때 사용합니다.
    pub fn discard_current(&mut self) -> Option<Entity> {
        self.entities.pop()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// 누적된 엔티티를 모두 꺼내고 목록을 비웁니다.
    pub fn take(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.entities)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
