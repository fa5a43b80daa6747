//! HTTP 계층 에러 타입
//!
//! HTTP 상태 코드 실패(4xx/5xx)와 연결 실패는 에러가 아니라
//! [`crate::client::HttpResult`] 데이터로 표현됩니다. 여기의 에러는 요청을
//! 만들 수조차 없는 로컬 문제만 다룹니다.

use invcollect_core::error::{InvcollectError, TransportError};

/// HTTP 계층 로컬 에러
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// URL 형식 오류
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// 지원하지 않는 메서드
    #[error("unsupported http method: {0}")]
    InvalidMethod(String),

    /// 헤더 이름/값 오류
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// 프록시 설정 오류
    #[error("proxy error: {0}")]
    Proxy(String),

    /// HTTP 클라이언트 생성 실패
    #[error("client build error: {0}")]
    Client(String),

    /// 디버그 로그 파일 I/O 에러
    #[error("debug sink io error: {0}")]
    DebugSink(#[from] std::io::Error),
}

impl From<HttpError> for InvcollectError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Proxy(reason) => InvcollectError::Transport(TransportError::Proxy(reason)),
            HttpError::DebugSink(e) => InvcollectError::Io(e),
            other => InvcollectError::Transport(TransportError::Request(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_display() {
        let err = HttpError::InvalidUrl {
            url: "graph/users".to_owned(),
            reason: "missing scheme".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("graph/users"));
        assert!(msg.contains("missing scheme"));
    }

    #[test]
    fn proxy_error_converts_to_transport_proxy() {
        let err: InvcollectError = HttpError::Proxy("bad url".to_owned()).into();
        assert!(matches!(
            err,
            InvcollectError::Transport(TransportError::Proxy(_))
        ));
    }

    #[test]
    fn method_error_converts_to_transport_request() {
        let err: InvcollectError = HttpError::InvalidMethod("BREW".to_owned()).into();
        assert!(matches!(
            err,
            InvcollectError::Transport(TransportError::Request(_))
        ));
    }
}
