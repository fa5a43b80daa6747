//! 요청/응답 디버그 로그
//!
//! `debugFile`이 설정되면 모든 요청, 응답, 재시도 결정을 한 줄씩 기록합니다.
//! 민감한 헤더 값은 끝 네 글자만 남기고 가립니다.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::error::HttpError;

/// 값을 가려야 하는 헤더 (소문자)
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
    "apikey",
    "x-auth-token",
    "ocp-apim-subscription-key",
];

/// 노출할 끝 글자 수
const VISIBLE_TAIL: usize = 4;

/// 민감한 헤더인지 확인합니다.
pub fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_HEADERS.contains(&name.as_str())
}

/// 끝 네 글자만 남기고 `*`로 가립니다. 짧은 값은 전부 가립니다.
pub fn mask_tail(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= VISIBLE_TAIL * 2 {
        return "*".repeat(chars.len().max(VISIBLE_TAIL));
    }
    let hidden = chars.len() - VISIBLE_TAIL;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{tail}", "*".repeat(hidden))
}

/// 헤더 값을 로그용으로 변환합니다.
pub fn display_header(name: &str, value: &str) -> String {
    if is_sensitive_header(name) {
        mask_tail(value)
    } else {
        value.to_owned()
    }
}

/// 디버그 로그 출력
pub struct DebugSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSink").finish_non_exhaustive()
    }
}

impl DebugSink {
    /// 파일을 추가 모드로 엽니다 (상위 디렉터리가 없으면 생성).
    pub fn open(path: &Path) -> Result<Self, HttpError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn request(&self, attempt: u32, method: &str, url: &str, headers: &[(String, String)]) {
        self.line(&format!("REQUEST attempt={attempt} {method} {url}"));
        self.headers(headers);
    }

    pub fn response(
        &self,
        status: u16,
        reason: &str,
        headers: &[(String, String)],
        body_len: usize,
    ) {
        self.line(&format!("RESPONSE {status} {reason} body_bytes={body_len}"));
        self.headers(headers);
    }

    pub fn retry(&self, attempt: u32, status: u16, delay: Duration) {
        self.line(&format!(
            "RETRY after attempt={attempt} status={status} backoff_ms={}",
            delay.as_millis()
        ));
    }

    pub fn give_up(&self, attempt: u32, status: u16) {
        self.line(&format!("NO RETRY after attempt={attempt} status={status}"));
    }

    pub fn failure(&self, attempt: u32, reason: &str) {
        self.line(&format!("FAILURE attempt={attempt} {reason}"));
    }

    fn headers(&self, headers: &[(String, String)]) {
        for (name, value) in headers {
            self.line(&format!("  {name}: {}", display_header(name, value)));
        }
    }

    fn line(&self, text: &str) {
        let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = writeln!(out, "{stamp} {text}").and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write http debug log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn mask_keeps_tail_only() {
        assert_eq!(mask_tail("Bearer abcdef123456"), "***************3456");
        assert_eq!(mask_tail("short"), "*****");
        assert_eq!(mask_tail(""), "****");
    }

    #[test]
    fn sensitive_headers_are_case_insensitive() {
        assert!(is_sensitive_header("Authorization"));
        assert!(is_sensitive_header("X-Api-Key"));
        assert!(!is_sensitive_header("Accept"));
    }

    #[test]
    fn sink_masks_sensitive_headers() {
        let buf = SharedBuf::default();
        let sink = DebugSink::from_writer(buf.clone());
        sink.request(
            1,
            "GET",
            "https://h/p",
            &[
                ("Authorization".to_owned(), "Bearer secret-token-9876".to_owned()),
                ("Accept".to_owned(), "application/json".to_owned()),
            ],
        );
        sink.retry(1, 503, Duration::from_millis(420));

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("REQUEST attempt=1 GET https://h/p"));
        assert!(!text.contains("secret-token"));
        assert!(text.contains("9876"));
        assert!(text.contains("Accept: application/json"));
        assert!(text.contains("RETRY after attempt=1 status=503 backoff_ms=420"));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("http-debug.log");
        let sink = DebugSink::open(&path).unwrap();
        sink.failure(1, "connection refused");
        drop(sink);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("FAILURE attempt=1 connection refused"));
    }
}
