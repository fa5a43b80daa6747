//! 실행 파라미터 전송 인코딩
//!
//! 수집기는 하나의 문자열 인자로 실행 파라미터를 전달받습니다.
//!
//! # 인코딩 형식
//!
//! ```text
//! base64( "key1,base64(value1);key2,base64(value2);..." )
//! ```
//!
//! - `params` 키의 값은 `@{k=v; k2=v2}` 형태의 맵 리터럴이며, 펼쳐서 병합됩니다.
//! - Base64가 아닌 입력은 `key,value#key2,value2` 평문 목록으로 간주하고
//!   즉석에서 인코딩한 뒤 같은 경로로 디코딩합니다.
//!
//! # 사용 예시
//!
//! ```
//! use invcollect_core::params::{decode_params, encode_params};
//!
//! let blob = encode_params([("dataDir", "/out"), ("version", "9.0.1")]);
//! let params = decode_params(&blob).unwrap();
//! assert_eq!(params.get("DATADIR"), Some("/out"));
//! ```

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::ParamError;

/// 외부 블롭 안의 `key,value` 쌍 구분자
const PAIR_SEPARATOR: char = ';';
/// 평문 입력의 쌍 구분자
const PLAIN_PAIR_SEPARATOR: char = '#';
/// 중첩 맵 리터럴을 담는 파라미터 이름
const NESTED_PARAMS_KEY: &str = "params";

/// 디코딩된 실행 파라미터
///
/// 키 조회는 대소문자를 구분하지 않습니다. 같은 키가 대소문자만 달리
/// 여러 번 들어오면 마지막 값이 남습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunParameters {
    values: BTreeMap<String, String>,
}

impl RunParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// 값을 추가하거나 덮어씁니다.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.values.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.values.insert(key, value.into());
    }

    /// 대소문자 구분 없이 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// 공백이 아닌 값만 반환합니다.
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.values
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RunParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl From<BTreeMap<String, String>> for RunParameters {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// 문자열이 엄격한 표준 Base64인지 검사합니다.
///
/// 길이가 4의 배수이고, 알파벳 `[A-Za-z0-9+/]`만 사용하며, `=` 패딩은
/// 끝에 최대 두 개까지만 허용합니다. 빈 문자열은 Base64로 보지 않습니다.
pub fn is_base64(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return false;
    }

    let padding = bytes.iter().rev().take_while(|&&b| b == b'=').count();
    if padding > 2 {
        return false;
    }

    bytes[..bytes.len() - padding]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/')
}

/// 키/값 목록을 전송 블롭으로 인코딩합니다.
pub fn encode_params<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let joined = pairs
        .into_iter()
        .map(|(k, v)| format!("{},{}", k.as_ref(), STANDARD.encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join(&PAIR_SEPARATOR.to_string());
    STANDARD.encode(joined)
}

/// 전송 블롭을 실행 파라미터로 디코딩합니다.
///
/// # Errors
///
/// - `ParamError::InvalidEncoding`: 블롭 또는 값이 Base64/UTF-8이 아님
/// - `ParamError::MalformedPair`: `key,value` 형식이 아님
/// - `ParamError::MalformedMap`: `params` 맵 리터럴 형식 오류
pub fn decode_params(raw: &str) -> Result<RunParameters, ParamError> {
    let raw = raw.trim();

    let blob = if is_base64(raw) {
        raw.to_owned()
    } else {
        debug!("run parameter blob is not base64, treating it as a plain list");
        encode_params(parse_plain_pairs(raw)?)
    };

    let outer = decode_utf8("<blob>", &blob)?;
    let mut params = RunParameters::new();
    let mut nested = None;

    for pair in outer.split(PAIR_SEPARATOR).filter(|p| !p.trim().is_empty()) {
        let (key, encoded) = pair.split_once(',').ok_or_else(|| ParamError::MalformedPair {
            pair: pair.to_owned(),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParamError::MalformedPair {
                pair: pair.to_owned(),
            });
        }

        let value = decode_utf8(key, encoded.trim())?;
        if key.eq_ignore_ascii_case(NESTED_PARAMS_KEY) {
            nested = Some(value);
        } else {
            params.insert(key, value);
        }
    }

    // 외부 키(dataDir, version 등)가 중첩 맵의 같은 키보다 우선합니다.
    if let Some(literal) = nested {
        for (key, value) in parse_map_literal(&literal)? {
            if !params.contains_key(&key) {
                params.insert(key, value);
            }
        }
    }

    debug!(count = params.len(), "decoded run parameters");
    Ok(params)
}

fn decode_utf8(key: &str, encoded: &str) -> Result<String, ParamError> {
    if encoded.is_empty() {
        return Ok(String::new());
    }
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ParamError::InvalidEncoding {
            key: key.to_owned(),
            reason: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| ParamError::InvalidEncoding {
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

/// `key,value#key2,value2` 평문 목록을 파싱합니다.
pub fn parse_plain_pairs(raw: &str) -> Result<Vec<(String, String)>, ParamError> {
    raw.split(PLAIN_PAIR_SEPARATOR)
        .filter(|p| !p.trim().is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once(',').ok_or_else(|| ParamError::MalformedPair {
                pair: pair.to_owned(),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ParamError::MalformedPair {
                    pair: pair.to_owned(),
                });
            }
            Ok((key.to_owned(), value.to_owned()))
        })
        .collect()
}

/// `@{k=v; k2='v 2'}` 형태의 맵 리터럴을 파싱합니다.
///
/// `@{ }` 래퍼는 생략할 수 있습니다. 항목 구분자는 `;` 또는 줄바꿈이며,
/// 따옴표 안의 구분자는 값의 일부로 취급합니다. `$true`/`$false`/`$null`
/// 토큰은 각각 `true`/`false`/빈 문자열이 됩니다.
pub fn parse_map_literal(literal: &str) -> Result<Vec<(String, String)>, ParamError> {
    let trimmed = literal.trim();
    let body = match trimmed.strip_prefix("@{") {
        Some(rest) => rest
            .strip_suffix('}')
            .ok_or_else(|| ParamError::MalformedMap("missing closing '}'".to_owned()))?,
        None => trimmed,
    };

    let mut entries = Vec::new();
    for item in split_unquoted(body)? {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| ParamError::MalformedMap(format!("entry '{item}' has no '='")))?;
        let key = unquote(key.trim());
        if key.is_empty() {
            return Err(ParamError::MalformedMap(format!("entry '{item}' has no key")));
        }
        let value = match value.trim() {
            "$true" => "true".to_owned(),
            "$false" => "false".to_owned(),
            "$null" => String::new(),
            other => unquote(other),
        };
        entries.push((key, value));
    }
    Ok(entries)
}

fn split_unquoted(body: &str) -> Result<Vec<String>, ParamError> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in body.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ';' || c == '\n' || c == '\r' => {
                items.push(std::mem::take(&mut current));
            }
            None => current.push(c),
        }
    }

    if quote.is_some() {
        return Err(ParamError::MalformedMap("unterminated quoted value".to_owned()));
    }
    items.push(current);
    Ok(items)
}

fn unquote(s: &str) -> String {
    for q in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return s[1..s.len() - 1].to_owned();
        }
    }
    s.to_owned()
}
