//! 외부 XML 설정 파일
//!
//! 호스트 제품이 버전별 고정 위치에 두는 XML 설정 파일에서 이름으로 값을 찾습니다.
//!
//! ```xml
//! <configuration>
//!   <invcollect>
//!     <settings>
//!       <add key="proxyUrl" value="http://proxy.local:8080" />
//!     </settings>
//!   </invcollect>
//! </configuration>
//! ```
//!
//! 파일이 없거나 형식이 잘못되어도 [`SettingsFile::load`]는 실패하지 않고
//! 빈 설정을 반환합니다. 읽기 전용이며 파일을 수정하지 않습니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::version::major_version;

/// 설정 항목이 위치하는 노드 경로 (소문자 비교)
const SETTINGS_NODE_PATH: [&str; 3] = ["configuration", "invcollect", "settings"];
/// 설정 파일 이름
const SETTINGS_FILE_NAME: &str = "settings.xml";

/// 외부 설정 파일 내용 (키는 소문자로 정규화)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsFile {
    values: BTreeMap<String, String>,
}

impl SettingsFile {
    /// 빈 설정을 생성합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 버전별 기본 설정 파일 경로를 반환합니다.
    ///
    /// - Windows: `%ProgramData%\invcollect\<major>.0\settings.xml`
    /// - 그 외: `/etc/invcollect/<major>.0/settings.xml`
    pub fn default_path(version: &str) -> Result<PathBuf, ConfigError> {
        let major = major_version(version)?;
        Ok(base_dir()
            .join(format!("{major}.0"))
            .join(SETTINGS_FILE_NAME))
    }

    /// 설정 파일을 읽습니다. 실패는 로그만 남기고 빈 설정을 반환합니다.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "settings file not found, using empty settings");
                return Self::empty();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read settings file, ignoring");
                return Self::empty();
            }
        };

        match Self::parse(&content) {
            Ok(settings) => {
                debug!(path = %path.display(), count = settings.len(), "loaded settings file");
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed settings file, ignoring");
                Self::empty()
            }
        }
    }

    /// XML 문자열을 파싱합니다.
    ///
    /// 알려진 노드 경로 밖의 `<add>` 요소는 무시합니다.
    pub fn parse(xml: &str) -> Result<Self, ConfigError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<String> = Vec::new();
        let mut values = BTreeMap::new();

        loop {
            let event = reader.read_event().map_err(|e| ConfigError::ParseFailed {
                reason: format!("settings xml at byte {}: {e}", reader.buffer_position()),
            })?;
            match event {
                Event::Start(e) => {
                    if at_settings_node(&stack) {
                        collect_setting(&e, &mut values)?;
                    }
                    stack.push(local_name(&e));
                }
                Event::Empty(e) => {
                    if at_settings_node(&stack) {
                        collect_setting(&e, &mut values)?;
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => {
                    if let Some(open) = stack.last() {
                        return Err(ConfigError::ParseFailed {
                            reason: format!("settings xml: element <{open}> is not closed"),
                        });
                    }
                    break;
                }
                _ => {}
            }
        }

        Ok(Self { values })
    }

    /// 대소문자 구분 없이 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn base_dir() -> PathBuf {
    if cfg!(windows) {
        std::env::var_os("ProgramData")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
            .join("invcollect")
    } else {
        PathBuf::from("/etc/invcollect")
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn at_settings_node(stack: &[String]) -> bool {
    stack.len() == SETTINGS_NODE_PATH.len()
        && stack.iter().zip(SETTINGS_NODE_PATH).all(|(a, b)| a == b)
}

fn collect_setting(
    e: &BytesStart<'_>,
    values: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    if local_name(e) != "add" {
        return Ok(());
    }

    let mut key = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ConfigError::ParseFailed {
            reason: format!("settings xml attribute: {err}"),
        })?;
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
        let text = attr
            .unescape_value()
            .map_err(|err| ConfigError::ParseFailed {
                reason: format!("settings xml attribute value: {err}"),
            })?
            .into_owned();
        match name.as_str() {
            "key" => key = Some(text),
            "value" => value = Some(text),
            _ => {}
        }
    }

    if let Some(key) = key {
        values.insert(key.to_ascii_lowercase(), value.unwrap_or_default());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <invcollect>
    <settings>
      <add key="proxyUrl" value="http://proxy.local:8080" />
      <add key="ApiUrl" value="https://api.example.com/?a=1&amp;b=2"></add>
    </settings>
  </invcollect>
  <other>
    <settings>
      <add key="ignored" value="x" />
    </settings>
  </other>
</configuration>"#;

    #[test]
    fn parse_reads_known_node_only() {
        let settings = SettingsFile::parse(SAMPLE).unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings.get("proxyurl"), Some("http://proxy.local:8080"));
        assert_eq!(
            settings.get("apiUrl"),
            Some("https://api.example.com/?a=1&b=2")
        );
        assert_eq!(settings.get("ignored"), None);
    }

    #[test]
    fn parse_rejects_malformed_xml() {
        assert!(SettingsFile::parse("<configuration><invcollect></configuration>").is_err());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let settings = SettingsFile::load(Path::new("/nonexistent/invcollect/settings.xml"));
        assert!(settings.is_empty());
    }

    #[test]
    fn load_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.xml");
        std::fs::write(&path, "<configuration><invcollect>").unwrap();
        let settings = SettingsFile::load(&path);
        assert!(settings.is_empty());
    }

    #[test]
    fn load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.xml");
        std::fs::write(&path, SAMPLE).unwrap();
        let settings = SettingsFile::load(&path);
        assert_eq!(settings.get("PROXYURL"), Some("http://proxy.local:8080"));
    }

    #[test]
    fn default_path_is_version_scoped() {
        let path = SettingsFile::default_path("9.0.1").unwrap();
        let display = path.display().to_string();
        assert!(display.contains("9.0"));
        assert!(display.ends_with("settings.xml"));
    }
}
