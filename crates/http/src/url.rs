//! URL 정규화
//!
//! 호출자가 미리 이스케이프했든 아니든 같은 결과가 나오도록, 경로 세그먼트와
//! 쿼리 키/값을 각각 "언이스케이프 후 재이스케이프"합니다. 따라서
//! `normalize_url(normalize_url(u)) == normalize_url(u)`입니다.
//!
//! - 스킴과 authority(`host:port`)는 그대로 둡니다.
//! - 비예약 문자(`A-Z a-z 0-9 - . _ ~`) 외에는 모두 `%XX`로 인코딩합니다.
//! - `+`는 공백이 아니라 리터럴 문자로 취급합니다.
//! - 프래그먼트는 그대로 둡니다.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::HttpError;

/// 비예약 문자를 제외한 모든 문자
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// URL을 origin / path / query / fragment로 나눈 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub origin: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

/// 절대 URL을 구성 요소로 나눕니다.
pub fn split_url(url: &str) -> Result<UrlParts<'_>, HttpError> {
    let invalid = |reason: &str| HttpError::InvalidUrl {
        url: url.to_owned(),
        reason: reason.to_owned(),
    };

    let scheme_end = url.find("://").ok_or_else(|| invalid("missing scheme"))?;
    let scheme = &url[..scheme_end];
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
    {
        return Err(invalid("invalid scheme"));
    }

    let after_scheme = scheme_end + 3;
    let authority_end = url[after_scheme..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |i| after_scheme + i);
    if authority_end == after_scheme {
        return Err(invalid("missing host"));
    }

    let (rest, fragment) = match url[authority_end..].split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (&url[authority_end..], None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    Ok(UrlParts {
        origin: &url[..authority_end],
        path,
        query,
        fragment,
    })
}

/// URL을 정규형으로 이스케이프합니다.
///
/// # Errors
///
/// 스킴(`https://`)이나 호스트가 없으면 `HttpError::InvalidUrl`
pub fn normalize_url(url: &str) -> Result<String, HttpError> {
    let parts = split_url(url.trim())?;

    let mut out = String::with_capacity(url.len() + 16);
    out.push_str(parts.origin);
    out.push_str(
        &parts
            .path
            .split('/')
            .map(reescape)
            .collect::<Vec<_>>()
            .join("/"),
    );

    if let Some(query) = parts.query {
        out.push('?');
        let pairs: Vec<String> = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => format!("{}={}", reescape(key), reescape(value)),
                None => reescape(pair),
            })
            .collect();
        out.push_str(&pairs.join("&"));
    }

    if let Some(fragment) = parts.fragment {
        out.push('#');
        out.push_str(fragment);
    }

    Ok(out)
}

fn reescape(component: &str) -> String {
    let decoded = percent_decode_str(component).decode_utf8_lossy();
    utf8_percent_encode(&decoded, COMPONENT).to_string()
}
