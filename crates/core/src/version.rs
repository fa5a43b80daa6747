//! 제품 버전 문자열 헬퍼

use crate::error::ConfigError;

/// 버전 문자열의 주 버전 번호를 반환합니다.
///
/// 첫 번째 `.` 앞의 선행 숫자만 사용합니다 (`"9.0.1"` → 9, `"12"` → 12,
/// `"v3.1"`처럼 숫자로 시작하지 않으면 에러).
pub fn major_version(version: &str) -> Result<u32, ConfigError> {
    let head = version.trim().split('.').next().unwrap_or_default();
    let digits: String = head.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
        field: "version".to_owned(),
        reason: format!("'{version}' does not start with a numeric major version"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_version_from_dotted() {
        assert_eq!(major_version("9.0.1").unwrap(), 9);
        assert_eq!(major_version("12.3").unwrap(), 12);
        assert_eq!(major_version(" 7 ").unwrap(), 7);
    }

    #[test]
    fn major_version_with_suffix() {
        assert_eq!(major_version("10-beta.2").unwrap(), 10);
    }

    #[test]
    fn major_version_rejects_non_numeric() {
        assert!(major_version("v3.1").is_err());
        assert!(major_version("").is_err());
    }
}
