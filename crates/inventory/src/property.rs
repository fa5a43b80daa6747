//! 속성 키 문법
//!
//! ```text
//! key        = path [ "{" attributes "}" ] [ path-rest ]
//! path       = segment *( "." segment )
//! attributes = attr *( ";" attr )
//! attr       = name ":" value
//! ```
//!
//! `{...}` 블록은 경로를 나누기 전에 제거되며, 그 안의 속성은 리프 요소의
//! XML 속성이 됩니다. 세그먼트가 두 개 이상이면 첫 세그먼트가 하위 그룹,
//! 마지막 세그먼트가 리프 이름입니다. 가운데 세그먼트는 사용하지 않습니다.

use crate::error::InventoryError;

/// 파싱된 속성 키
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKey {
    segments: Vec<String>,
    attributes: Vec<(String, String)>,
}

impl PropertyKey {
    /// 속성 키를 파싱합니다.
    ///
    /// # Errors
    ///
    /// 빈 세그먼트, XML 이름으로 쓸 수 없는 세그먼트, 닫히지 않은 `{`,
    /// `name:value` 형식이 아닌 속성, 같은 이름의 속성 반복은
    /// `InventoryError::InvalidKey`입니다.
    pub fn parse(raw: &str) -> Result<Self, InventoryError> {
        let invalid = |reason: &str| InventoryError::InvalidKey {
            key: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let (path, attributes) = match raw.find('{') {
            Some(open) => {
                let close = raw[open..]
                    .find('}')
                    .map(|i| open + i)
                    .ok_or_else(|| invalid("attribute block is not closed"))?;
                let path = format!("{}{}", &raw[..open], &raw[close + 1..]);
                let attributes = parse_attributes(&raw[open + 1..close]).map_err(|r| invalid(&r))?;
                (path, attributes)
            }
            None => (raw.to_owned(), Vec::new()),
        };

        let segments: Vec<String> = path.trim().split('.').map(|s| s.trim().to_owned()).collect();
        for segment in &segments {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if !is_xml_name(segment) {
                return Err(invalid(&format!("'{segment}' is not a valid element name")));
            }
        }

        Ok(Self {
            segments,
            attributes,
        })
    }

    /// 하위 그룹 이름 (세그먼트가 하나면 `None`)
    pub fn group(&self) -> Option<&str> {
        if self.segments.len() > 1 {
            self.segments.first().map(String::as_str)
        } else {
            None
        }
    }

    /// 리프 요소 이름
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

/// 그룹/리프/속성으로 키 문자열을 만듭니다. [`PropertyKey::parse`]의 역연산입니다.
pub fn compose_key(group: Option<&str>, leaf: &str, attributes: &[(String, String)]) -> String {
    let mut key = match group {
        Some(group) => format!("{group}.{leaf}"),
        None => leaf.to_owned(),
    };
    if !attributes.is_empty() {
        let attrs: Vec<String> = attributes.iter().map(|(k, v)| format!("{k}:{v}")).collect();
        key.push('{');
        key.push_str(&attrs.join(";"));
        key.push('}');
    }
    key
}

fn parse_attributes(block: &str) -> Result<Vec<(String, String)>, String> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    for pair in block.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (name, value) = pair
            .split_once(':')
            .ok_or_else(|| format!("attribute '{pair}' is not name:value"))?;
        let name = name.trim();
        if !is_xml_name(name) || name == "xmlns" {
            return Err(format!("'{name}' is not a valid attribute name"));
        }
        if attributes.iter().any(|(existing, _)| existing == name) {
            return Err(format!("attribute '{name}' is repeated"));
        }
        attributes.push((name.to_owned(), value.trim().to_owned()));
    }
    Ok(attributes)
}

/// XML 요소/속성 이름으로 쓸 수 있는지 검사합니다 (네임스페이스 접두어 제외).
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
