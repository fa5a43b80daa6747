//! 응답 본문 문자셋 디코딩
//!
//! `Content-Type`의 `charset` 파라미터를 따르되, JSON 응답은 항상 UTF-8로
//! 읽습니다. 알 수 없는 문자셋이면 UTF-8로 대체합니다.

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// `Content-Type` 헤더에서 `charset` 값을 찾습니다.
pub fn charset_of(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
    })
}

/// JSON 계열 미디어 타입인지 확인합니다 (`application/json`, `*+json`).
pub fn is_json(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json") || mime == "text/json"
}

/// 본문을 문자열로 디코딩합니다.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .filter(|ct| !is_json(ct))
        .and_then(charset_of)
        .and_then(|label| {
            let encoding = Encoding::for_label(label.as_bytes());
            if encoding.is_none() {
                debug!(charset = label, "unknown response charset, falling back to utf-8");
            }
            encoding
        })
        .unwrap_or(UTF_8);

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors && encoding != UTF_8 {
        debug!(
            charset = encoding.name(),
            "response body is not valid in declared charset, decoding as utf-8"
        );
        return String::from_utf8_lossy(bytes).into_owned();
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_parameter_is_found() {
        assert_eq!(charset_of("text/html; charset=ISO-8859-1"), Some("ISO-8859-1"));
        assert_eq!(charset_of("text/plain;Charset=\"utf-8\""), Some("utf-8"));
        assert_eq!(charset_of("text/plain"), None);
    }

    #[test]
    fn latin1_body_is_decoded() {
        let body = [0x47, 0x72, 0xFC, 0xDF, 0x65]; // "Grüße" in latin-1
        assert_eq!(
            decode_body(&body, Some("text/plain; charset=iso-8859-1")),
            "Grüße"
        );
    }

    #[test]
    fn json_is_always_utf8() {
        let body = "{\"name\":\"Grüße\"}".as_bytes();
        assert_eq!(
            decode_body(body, Some("application/json; charset=iso-8859-1")),
            "{\"name\":\"Grüße\"}"
        );
        assert!(is_json("application/problem+json"));
    }

    #[test]
    fn missing_or_unknown_charset_uses_utf8() {
        let body = "Grüße".as_bytes();
        assert_eq!(decode_body(body, None), "Grüße");
        assert_eq!(decode_body(body, Some("text/plain; charset=klingon")), "Grüße");
    }

    #[test]
    fn invalid_utf8_is_lossy_not_fatal() {
        let text = decode_body(&[0x61, 0xFF, 0x62], None);
        assert_eq!(text, "a\u{FFFD}b");
    }
}
