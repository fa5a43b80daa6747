//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수로 `metrics::counter!()`를 호출합니다.
//! 레코더가 설치되지 않은 프로세스에서는 호출이 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `invcollect_`
//! - 모듈명: `http_`, `inventory_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(invcollect_core::metrics::HTTP_REQUESTS_TOTAL, "method" => "GET").increment(1);
//! ```

use metrics::describe_counter;

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// HTTP 메서드 레이블 키
pub const LABEL_METHOD: &str = "method";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── HTTP 메트릭 ────────────────────────────────────────────────────

/// HTTP: 논리적 요청 수 (counter, label: method)
pub const HTTP_REQUESTS_TOTAL: &str = "invcollect_http_requests_total";

/// HTTP: 재시도 수 (counter)
pub const HTTP_RETRIES_TOTAL: &str = "invcollect_http_retries_total";

/// HTTP: 실패로 끝난 요청 수 (counter, label: method)
pub const HTTP_FAILURES_TOTAL: &str = "invcollect_http_failures_total";

// ─── Inventory 메트릭 ───────────────────────────────────────────────

/// Inventory: 파일로 기록된 엔티티 수 (counter)
pub const INVENTORY_ENTITIES_WRITTEN_TOTAL: &str = "invcollect_inventory_entities_written_total";

/// Inventory: 기록된 인벤토리 파일 수 (counter, label: result)
pub const INVENTORY_FILES_WRITTEN_TOTAL: &str = "invcollect_inventory_files_written_total";

/// 모든 메트릭 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of logical HTTP requests issued"
    );
    describe_counter!(
        HTTP_RETRIES_TOTAL,
        "Total number of HTTP retry attempts after a server error"
    );
    describe_counter!(
        HTTP_FAILURES_TOTAL,
        "Total number of HTTP requests that ended without success"
    );
    describe_counter!(
        INVENTORY_ENTITIES_WRITTEN_TOTAL,
        "Total number of entities serialized to inventory files"
    );
    describe_counter!(
        INVENTORY_FILES_WRITTEN_TOTAL,
        "Total number of inventory file write attempts by result"
    );
}
