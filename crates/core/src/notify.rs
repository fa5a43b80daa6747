//! Notify 이벤트 라인
//!
//! 외부 작업 모니터가 표준 출력에서 읽는 한 줄짜리 이벤트입니다.
//!
//! ```text
//! NOTIFY {"Category":"Error","Name":"collect","ItemName":"","Message":"...","State":"Faulty","Info":"","ResultCode":1,"ItemResult":"Error"}
//! ```
//!
//! 같은 이벤트는 카테고리에 맞는 레벨로 `tracing`에도 기록됩니다.

use std::io::Write;

use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Notify 라인 접두어
pub const NOTIFY_PREFIX: &str = "NOTIFY ";

/// 이벤트 카테고리
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Category {
    #[default]
    None,
    Verbose,
    Info,
    Warning,
    Error,
}

/// 작업 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum State {
    #[default]
    None,
    Canceled,
    Faulty,
    Aborted,
    Finished,
    Calculating,
    Detecting,
    Queued,
    Executing,
}

/// 항목 처리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ItemResult {
    #[default]
    None,
    Canceled,
    Excluded,
    Error,
    Ok,
}

/// 표준화된 이벤트
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotifyEvent {
    pub category: Category,
    pub name: String,
    pub item_name: String,
    pub message: String,
    pub state: State,
    pub info: String,
    pub result_code: i32,
    pub item_result: ItemResult,
}

impl NotifyEvent {
    pub fn new(category: Category, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// 운영자에게 보고하는 치명적 에러 이벤트
    /// (`Category=Error`, `State=Faulty`, `ItemResult=Error`)
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Category::Error, name, message)
            .with_state(State::Faulty)
            .with_item_result(ItemResult::Error)
            .with_result_code(1)
    }

    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = item_name.into();
        self
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_result_code(mut self, result_code: i32) -> Self {
        self.result_code = result_code;
        self
    }

    pub fn with_item_result(mut self, item_result: ItemResult) -> Self {
        self.item_result = item_result;
        self
    }

    /// 개행 없는 한 줄로 포맷합니다.
    pub fn to_line(&self) -> String {
        // 문자열/열거형만 담은 구조체라 직렬화가 실패하지 않습니다.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{NOTIFY_PREFIX}{json}")
    }

    /// 표준 출력에 기록합니다.
    pub fn emit(&self) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = self.emit_to(&mut lock) {
            warn!(error = %e, "failed to write notify line to stdout");
        }
    }

    /// 지정한 출력에 기록하고 `tracing`에 미러링합니다.
    pub fn emit_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        self.trace();
        writeln!(out, "{}", self.to_line())?;
        out.flush()
    }

    fn trace(&self) {
        let name = self.name.as_str();
        let item = self.item_name.as_str();
        let message = self.message.as_str();
        match self.category {
            Category::Error => error!(name, item, state = ?self.state, "{message}"),
            Category::Warning => warn!(name, item, state = ?self.state, "{message}"),
            Category::Info => info!(name, item, state = ?self.state, "{message}"),
            Category::Verbose | Category::None => debug!(name, item, state = ?self.state, "{message}"),
        }
    }
}
