//! `.inv` 파일 기록
//!
//! [`InventoryWriter::flush_and_clear`]는 누적된 엔티티를 직렬화해 파일로 쓰고,
//! 성공 여부와 관계없이 누적기를 비웁니다. 직렬화는 파일을 열기 전에 메모리에서
//! 끝나므로 직렬화 실패 시 부분 파일이 남지 않습니다.

use std::path::{Path, PathBuf};

use chrono::Utc;
use metrics::counter;
use tracing::{error, info};
use uuid::Uuid;

use invcollect_core::metrics::{
    INVENTORY_ENTITIES_WRITTEN_TOTAL, INVENTORY_FILES_WRITTEN_TOTAL, LABEL_RESULT,
};

use crate::entity::{Entity, EntityAccumulator};
use crate::envelope::envelope;
use crate::error::InventoryError;
use crate::serializer::serialize;

/// 인벤토리 파일 확장자
pub const INVENTORY_EXTENSION: &str = "inv";

/// 실행마다 겹치지 않는 파일 이름 (`<agent>_<yyyyMMdd-HHmmss>_<8hex>.inv`)
pub fn inventory_file_name(agent: &str) -> String {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    let agent: String = agent
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{agent}_{stamp}_{}.{INVENTORY_EXTENSION}", &suffix[..8])
}

/// 인벤토리 문서 메타데이터와 기록 옵션
#[derive(Debug, Clone)]
pub struct InventoryWriter {
    version: String,
    agent: String,
    use_data_namespace: bool,
}

impl InventoryWriter {
    pub fn new(version: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            agent: agent.into(),
            use_data_namespace: false,
        }
    }

    pub fn use_data_namespace(mut self, enabled: bool) -> Self {
        self.use_data_namespace = enabled;
        self
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// 엔티티 목록으로 완성된 문서(XML 선언 포함)를 만듭니다.
    pub fn render(&self, entities: &[Entity]) -> Result<String, InventoryError> {
        let fragment = serialize(entities, &self.version, self.use_data_namespace)?;
        envelope(&fragment, &self.version, &self.agent, Utc::now())?.render(true)
    }

    /// 누적된 엔티티를 `destination` 파일에 쓰고 누적기를 비웁니다.
    ///
    /// 누적기는 에러가 나도 비워집니다.
    pub fn flush_and_clear(
        &self,
        accumulator: &mut EntityAccumulator,
        destination: &Path,
    ) -> Result<(), InventoryError> {
        let entities = accumulator.take();
        let result = self.write_file(&entities, destination);
        match &result {
            Ok(()) => {
                counter!(INVENTORY_FILES_WRITTEN_TOTAL, LABEL_RESULT => "success").increment(1);
                counter!(INVENTORY_ENTITIES_WRITTEN_TOTAL).increment(entities.len() as u64);
                info!(
                    path = %destination.display(),
                    entity_count = entities.len(),
                    "inventory file written"
                );
            }
            Err(e) => {
                counter!(INVENTORY_FILES_WRITTEN_TOTAL, LABEL_RESULT => "failure").increment(1);
                error!(
                    path = %destination.display(),
                    entity_count = entities.len(),
                    error = %e,
                    "failed to write inventory file, entities discarded"
                );
            }
        }
        result
    }

    /// 디렉터리에 새 파일 이름으로 기록하고 경로를 반환합니다.
    ///
    /// 디렉터리가 없으면 만듭니다.
    pub fn flush_to_dir(
        &self,
        accumulator: &mut EntityAccumulator,
        dir: &Path,
    ) -> Result<PathBuf, InventoryError> {
        if let Err(e) = std::fs::create_dir_all(dir) {
            accumulator.clear();
            return Err(e.into());
        }
        let path = dir.join(inventory_file_name(&self.agent));
        self.flush_and_clear(accumulator, &path)?;
        Ok(path)
    }

    fn write_file(&self, entities: &[Entity], destination: &Path) -> Result<(), InventoryError> {
        let document = self.render(entities)?;
        std::fs::write(destination, document)?;
        Ok(())
    }
}
