//! 설정 값 타입 변환
//!
//! 모든 설정 원본(파라미터, 설정 파일, 기본값)은 문자열로 들어오며,
//! 각 설정이 선언한 [`SettingKind`]에 따라 [`SettingValue`]로 변환됩니다.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::ConfigError;

const TRUE_TOKENS: [&str; 6] = ["true", "t", "yes", "y", "on", "1"];
const FALSE_TOKENS: [&str; 6] = ["false", "f", "no", "n", "off", "0"];

/// 불리언 토큰을 해석합니다 (대소문자 구분 없음, 앞뒤 공백 무시).
///
/// 인식할 수 없는 문자열이면 `None`을 반환합니다.
pub fn try_parse_bool(raw: &str) -> Option<bool> {
    let token = raw.trim().to_ascii_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// 불리언으로 변환합니다. 값이 없거나 인식할 수 없으면 `false`입니다.
pub fn to_bool(raw: Option<&str>) -> bool {
    raw.and_then(try_parse_bool).unwrap_or(false)
}

/// 날짜/시각 문자열을 UTC로 해석합니다.
///
/// RFC 3339, `yyyy-MM-dd HH:mm:ss`, `yyyy-MM-ddTHH:mm:ss`, `yyyy-MM-dd`를 지원하며
/// 타임존이 없는 값은 UTC로 간주합니다.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 설정이 기대하는 값 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    String,
    Int,
    Bool,
    Double,
    DateTime,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::Double => write!(f, "double"),
            Self::DateTime => write!(f, "datetime"),
        }
    }
}

/// 타입 변환된 설정 값
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    String(String),
    Int(i64),
    Bool(bool),
    Double(f64),
    DateTime(DateTime<Utc>),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

/// 원시 문자열을 선언된 타입으로 변환합니다.
///
/// 불리언은 인식할 수 없으면 `false`가 되고, 숫자/날짜는 변환 실패 시
/// `ConfigError::InvalidValue`를 반환합니다.
pub fn coerce(name: &str, raw: &str, kind: SettingKind) -> Result<SettingValue, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        field: name.to_owned(),
        reason: format!("'{raw}' is not a valid {kind}"),
    };

    match kind {
        SettingKind::String => Ok(SettingValue::String(raw.trim().to_owned())),
        SettingKind::Bool => Ok(SettingValue::Bool(to_bool(Some(raw)))),
        SettingKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(SettingValue::Int)
            .map_err(|_| invalid()),
        SettingKind::Double => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(SettingValue::Double)
            .ok_or_else(invalid),
        SettingKind::DateTime => parse_datetime(raw)
            .map(SettingValue::DateTime)
            .ok_or_else(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_tokens() {
        for token in ["yes", "Y", "1", "on", "true", "True", "T", " TRUE "] {
            assert!(to_bool(Some(token)), "{token} should be true");
        }
    }

    #[test]
    fn falsey_tokens() {
        for token in ["no", "0", "off", "false", "FALSE", "f", "N"] {
            assert_eq!(try_parse_bool(token), Some(false), "{token}");
            assert!(!to_bool(Some(token)));
        }
    }

    #[test]
    fn missing_and_empty_are_false() {
        assert!(!to_bool(None));
        assert!(!to_bool(Some("")));
    }

    #[test]
    fn unrecognized_is_false_not_error() {
        assert_eq!(try_parse_bool("maybe"), None);
        assert!(!to_bool(Some("maybe")));
        let value = coerce("proxyActive", "maybe", SettingKind::Bool).unwrap();
        assert_eq!(value, SettingValue::Bool(false));
    }

    #[test]
    fn coerce_int_and_double() {
        assert_eq!(
            coerce("timeoutSeconds", " 30 ", SettingKind::Int).unwrap(),
            SettingValue::Int(30)
        );
        assert_eq!(
            coerce("requestDelaySeconds", "0.5", SettingKind::Double).unwrap(),
            SettingValue::Double(0.5)
        );
    }

    #[test]
    fn coerce_invalid_int_is_error() {
        let err = coerce("timeoutSeconds", "ten", SettingKind::Int).unwrap_err();
        assert!(err.to_string().contains("timeoutSeconds"));
    }

    #[test]
    fn coerce_rejects_nan_double() {
        assert!(coerce("requestDelaySeconds", "NaN", SettingKind::Double).is_err());
    }

    #[test]
    fn parse_datetime_formats() {
        let expected = parse_datetime("2024-03-01T10:20:30Z").unwrap();
        assert_eq!(parse_datetime("2024-03-01 10:20:30"), Some(expected));
        assert_eq!(parse_datetime("2024-03-01T10:20:30"), Some(expected));
        assert_eq!(parse_datetime("2024-03-01T12:20:30+02:00"), Some(expected));
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn coerce_string_trims() {
        assert_eq!(
            coerce("apiUrl", "  https://example.com  ", SettingKind::String).unwrap(),
            SettingValue::String("https://example.com".to_owned())
        );
    }
}
