//! 복원력 있는 HTTP 클라이언트
//!
//! [`HttpClient::request`]는 HTTP 수준의 실패를 에러로 던지지 않고 항상
//! [`HttpResult`]로 돌려줍니다. `Err`는 URL/메서드/헤더가 잘못되어 요청을
//! 만들 수 없는 경우뿐입니다.
//!
//! 요청 흐름:
//! 1. URL 정규화 ([`crate::url::normalize_url`])
//! 2. 전송 → 5xx GET이면 [`RetryPolicy`]에 따라 백오프 후 재시도
//! 3. 본문 문자셋 디코딩 ([`crate::charset::decode_body`])
//! 4. 실패 응답이면 에러 본문 추출

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, info, warn};

use invcollect_core::config::HttpConfig;
use invcollect_core::effective::EffectiveConfig;
use invcollect_core::metrics::{
    HTTP_FAILURES_TOTAL, HTTP_REQUESTS_TOTAL, HTTP_RETRIES_TOTAL, LABEL_METHOD,
};

use crate::charset::decode_body;
use crate::debug::DebugSink;
use crate::error::HttpError;
use crate::proxy::ProxyDescriptor;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, Method, RawRequest, RawResponse, ReqwestTransport};
use crate::url::normalize_url;

/// 응답을 받지 못했을 때의 상태 설명
pub const TRANSPORT_FAILURE: &str = "Transport Failure";

/// 요청 결과 (성공/실패 공통)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResult {
    pub is_success: bool,
    /// 응답을 받지 못했으면 0
    pub status_code: u16,
    pub status_description: String,
    /// 응답을 받지 못했으면 `None` (키는 소문자, 중복 헤더는 `, `로 결합)
    pub headers: Option<BTreeMap<String, String>>,
    /// 성공 시 본문, 실패 시 추출한 에러 본문
    pub body: String,
}

impl HttpResult {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 본문을 JSON으로 파싱합니다.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    fn from_response(response: &RawResponse) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &response.headers {
            headers
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.clone());
        }

        let text = decode_body(&response.body, response.header("content-type"));
        let is_success = (200..=299).contains(&response.status);
        let reason = if response.reason.is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.reason.clone()
        };
        let body = if is_success {
            text
        } else {
            extract_error_body(&text).unwrap_or_else(|| reason.clone())
        };

        Self {
            is_success,
            status_code: response.status,
            status_description: reason,
            headers: Some(headers),
            body,
        }
    }

    fn transport_failure(message: &str) -> Self {
        Self {
            is_success: false,
            status_code: 0,
            status_description: TRANSPORT_FAILURE.to_owned(),
            headers: None,
            body: message.to_owned(),
        }
    }
}

/// 실패 응답 본문에서 사람이 읽을 에러 메시지를 찾습니다.
///
/// JSON이면 `error.message`, `error_description`, `message`, `detail`, `title`,
/// 문자열 `error` 순으로 찾고, 아니면 본문 텍스트를 그대로 사용합니다.
/// 본문이 비어 있으면 `None`입니다.
pub fn extract_error_body(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let candidates = [
            json.pointer("/error/message"),
            json.get("error_description"),
            json.get("message"),
            json.get("detail"),
            json.get("title"),
            json.get("error"),
        ];
        if let Some(message) = candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str().filter(|s| !s.trim().is_empty()))
        {
            return Some(message.trim().to_owned());
        }
    }
    Some(trimmed.to_owned())
}

/// 복원력 있는 HTTP 클라이언트
pub struct HttpClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    retry: RetryPolicy,
    debug: Option<Arc<DebugSink>>,
    default_headers: Vec<(String, String)>,
}

impl HttpClient<ReqwestTransport> {
    /// 실행 설정과 에이전트 HTTP 설정으로 클라이언트를 만듭니다.
    ///
    /// 디버그 파일은 실행 설정의 `debugFile`이 우선이고, 없으면 `[http] debug_file`을 씁니다.
    pub fn from_config(config: &EffectiveConfig, http: &HttpConfig) -> Result<Self, HttpError> {
        let proxy = ProxyDescriptor::from_config(&config.proxy)?;
        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let transport = ReqwestTransport::new(timeout, proxy.as_ref())?;

        let mut client = Self::with_transport(transport, RetryPolicy::from_config(http));
        let debug_file = config.debug_file.clone().or_else(|| {
            Some(PathBuf::from(&http.debug_file)).filter(|p| !p.as_os_str().is_empty())
        });
        if let Some(path) = debug_file {
            info!(path = %path.display(), "http debug log enabled");
            client = client.with_debug_sink(DebugSink::open(&path)?);
        }
        Ok(client)
    }
}

impl<T: HttpTransport> HttpClient<T> {
    pub fn with_transport(transport: T, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            debug: None,
            default_headers: Vec::new(),
        }
    }

    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug = Some(Arc::new(sink));
        self
    }

    /// 모든 요청에 붙일 헤더 (요청별 같은 이름 헤더가 있으면 그쪽이 우선)
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResult, HttpError> {
        self.request(Method::Get, url, headers, None).await
    }

    /// 요청을 보냅니다.
    ///
    /// # Errors
    ///
    /// URL 또는 헤더가 잘못되었을 때만 `Err`를 반환합니다. HTTP 에러 상태,
    /// 연결 실패, 재시도 소진은 `is_success == false`인 결과입니다.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<HttpResult, HttpError> {
        let url = normalize_url(url)?;
        let headers = self.merge_headers(headers)?;
        let body = body.map(|b| Bytes::copy_from_slice(b.as_bytes()));

        counter!(HTTP_REQUESTS_TOTAL, LABEL_METHOD => method.as_str()).increment(1);

        let mut attempt: u32 = 1;
        loop {
            if let Some(sink) = &self.debug {
                sink.request(attempt, method.as_str(), &url, &headers);
            }

            let request = RawRequest {
                method,
                url: url.clone(),
                headers: headers.clone(),
                body: body.clone(),
            };

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(failure) => {
                    warn!(%method, url = %url, attempt, error = %failure, "http transport failure");
                    if let Some(sink) = &self.debug {
                        sink.failure(attempt, &failure.message);
                    }
                    counter!(HTTP_FAILURES_TOTAL, LABEL_METHOD => method.as_str()).increment(1);
                    return Ok(HttpResult::transport_failure(&failure.message));
                }
            };

            if let Some(sink) = &self.debug {
                sink.response(
                    response.status,
                    &response.reason,
                    &response.headers,
                    response.body.len(),
                );
            }

            if self.retry.should_retry(method, response.status, attempt) {
                let backoff = self.retry.backoff(attempt);
                warn!(
                    %method,
                    url = %url,
                    attempt,
                    status = response.status,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    "retrying request after server error"
                );
                if let Some(sink) = &self.debug {
                    sink.retry(attempt, response.status, backoff);
                }
                counter!(HTTP_RETRIES_TOTAL).increment(1);
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let result = HttpResult::from_response(&response);
            if !result.is_success {
                if RetryPolicy::is_retryable(method, response.status) {
                    warn!(%method, url = %url, attempt, status = response.status, "retries exhausted");
                }
                if let Some(sink) = &self.debug {
                    sink.give_up(attempt, response.status);
                }
                counter!(HTTP_FAILURES_TOTAL, LABEL_METHOD => method.as_str()).increment(1);
            }
            debug!(
                %method,
                url = %url,
                attempt,
                status = result.status_code,
                success = result.is_success,
                "http request completed"
            );
            return Ok(result);
        }
    }

    fn merge_headers(&self, headers: &[(&str, &str)]) -> Result<Vec<(String, String)>, HttpError> {
        let mut merged: Vec<(String, String)> = self
            .default_headers
            .iter()
            .filter(|(name, _)| !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)))
            .cloned()
            .collect();
        merged.extend(headers.iter().map(|(n, v)| ((*n).to_owned(), (*v).to_owned())));

        for (name, value) in &merged {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(merged)
    }
}
