//! HTTP 전송 추상화
//!
//! [`HttpTransport`] trait으로 실제 네트워크 호출을 감싸, 운영 코드는
//! [`ReqwestTransport`]를, 테스트는 스크립트된 목(mock) 전송을 사용합니다.
//!
//! ```text
//! HttpClient (URL 정규화, 재시도, 디코딩)
//!      │
//!      ▼
//! HttpTransport (trait)
//!    │        │
//!    ▼        ▼
//! Reqwest    Mock
//! ```

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::error::HttpError;
use crate::proxy::ProxyDescriptor;

/// HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            _ => Err(HttpError::InvalidMethod(s.to_owned())),
        }
    }
}

/// 전송 계층에 넘기는 요청 (URL은 이미 정규화됨)
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

/// 전송 계층 응답 (본문은 임시 버퍼에 모두 읽은 상태)
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// 응답을 받지 못한 전송 실패 (연결 거부, 타임아웃 등)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// HTTP 전송 추상화
pub trait HttpTransport: Send + Sync + 'static {
    /// 요청 하나를 보내고 응답 본문까지 읽습니다.
    ///
    /// HTTP 상태와 관계없이 응답을 받았으면 `Ok`입니다.
    fn send(
        &self,
        request: RawRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportFailure>> + Send;
}

/// reqwest 기반 전송
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 타임아웃과 프록시로 클라이언트를 만듭니다.
    ///
    /// 프록시가 `None`이면 reqwest 기본값(환경변수 프록시)을 따릅니다.
    pub fn new(timeout: Duration, proxy: Option<&ProxyDescriptor>) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("invcollect/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = proxy {
            debug!(proxy = proxy.url(), "using configured proxy");
            builder = builder.proxy(proxy.to_reqwest()?);
        }
        let client = builder
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| TransportFailure {
            message: describe_reqwest_error(&e),
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_owned(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await.map_err(|e| TransportFailure {
            message: format!("failed to read response body: {}", describe_reqwest_error(&e)),
        })?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body,
        })
    }
}

/// 원인 체인을 포함한 에러 문자열
fn describe_reqwest_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
