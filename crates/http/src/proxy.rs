//! 프록시 디스크립터
//!
//! [`ProxyConfig`]에서 실제 요청에 쓸 프록시 설정을 만듭니다.
//!
//! - 비활성이거나 URL이 없으면 프록시를 지정하지 않습니다 (reqwest 기본 동작,
//!   즉 `HTTPS_PROXY` 등 환경변수 프록시 사용).
//! - 스킴이 없는 URL에는 `http://`를 붙입니다.
//! - 명시적 사용자명이 있으면 명시적 자격 증명(비밀번호 없으면 빈 문자열)을,
//!   없으면 요청에 따라 기본(환경) 자격 증명을 사용합니다.

use invcollect_core::effective::ProxyConfig;
use reqwest::Url;
use tracing::{debug, warn};

use crate::error::HttpError;

/// 프록시 자격 증명
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyCredentials {
    /// 명시적 사용자명/비밀번호
    Explicit { username: String, password: String },
    /// 환경(기본) 자격 증명
    Default,
    /// 자격 증명 없음
    None,
}

/// 요청에 적용할 프록시 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDescriptor {
    url: String,
    bypass_on_local: bool,
    bypass_list: Vec<String>,
    credentials: ProxyCredentials,
}

impl ProxyDescriptor {
    /// 프록시 설정으로 디스크립터를 만듭니다.
    ///
    /// 비활성이거나 URL이 비어 있으면 `None`입니다.
    pub fn from_config(config: &ProxyConfig) -> Result<Option<Self>, HttpError> {
        if !config.active {
            return Ok(None);
        }
        let Some(raw) = config.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            debug!("proxy is active but no url is configured, using environment defaults");
            return Ok(None);
        };

        let url = if raw.contains("://") {
            raw.to_owned()
        } else {
            format!("http://{raw}")
        };
        Url::parse(&url).map_err(|e| HttpError::Proxy(format!("invalid proxy url '{url}': {e}")))?;

        let credentials = match config.username.as_deref().filter(|u| !u.is_empty()) {
            Some(username) => ProxyCredentials::Explicit {
                username: username.to_owned(),
                password: config.password.clone().unwrap_or_default(),
            },
            None if config.use_default_credentials => ProxyCredentials::Default,
            None => ProxyCredentials::None,
        };

        Ok(Some(Self {
            url,
            bypass_on_local: config.bypass_on_local,
            bypass_list: config.bypass_list.clone(),
            credentials,
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn credentials(&self) -> &ProxyCredentials {
        &self.credentials
    }

    /// 이 호스트가 프록시를 거치지 않아야 하는지 판단합니다.
    pub fn bypasses(&self, host: &str) -> bool {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if self.bypass_on_local && is_local_host(host) {
            return true;
        }
        self.bypass_list
            .iter()
            .any(|pattern| glob_match(&pattern.to_ascii_lowercase(), &host.to_ascii_lowercase()))
    }

    /// reqwest 프록시로 변환합니다.
    ///
    /// 기본 자격 증명은 reqwest에 대응 개념이 없으므로 인증 헤더를 붙이지 않고
    /// 경고만 남깁니다.
    pub fn to_reqwest(&self) -> Result<reqwest::Proxy, HttpError> {
        let target = Url::parse(&self.url)
            .map_err(|e| HttpError::Proxy(format!("invalid proxy url '{}': {e}", self.url)))?;
        let descriptor = self.clone();
        let proxy = reqwest::Proxy::custom(move |url| {
            let host = url.host_str().unwrap_or_default();
            if descriptor.bypasses(host) {
                None
            } else {
                Some(target.clone())
            }
        });

        Ok(match &self.credentials {
            ProxyCredentials::Explicit { username, password } => {
                proxy.basic_auth(username, password)
            }
            ProxyCredentials::Default => {
                warn!(
                    proxy = %self.url,
                    "default proxy credentials requested but not supported, sending no proxy auth"
                );
                proxy
            }
            ProxyCredentials::None => proxy,
        })
    }
}

/// 로컬 주소 판단: 점 없는 호스트명, `localhost`, 루프백 주소
fn is_local_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        return ip.is_loopback();
    }
    !host.is_empty() && !host.contains('.')
}

/// 간단한 glob 패턴 매칭 (*, ? 지원)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut star_t = 0;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(sp) = star {
            p = sp + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(url: &str) -> ProxyConfig {
        ProxyConfig {
            active: true,
            url: Some(url.to_owned()),
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn inactive_or_missing_url_yields_none() {
        assert_eq!(ProxyDescriptor::from_config(&ProxyConfig::default()).unwrap(), None);
        let config = ProxyConfig {
            active: true,
            ..ProxyConfig::default()
        };
        assert_eq!(ProxyDescriptor::from_config(&config).unwrap(), None);
    }

    #[test]
    fn default_scheme_is_http() {
        let proxy = ProxyDescriptor::from_config(&active("proxy.local:3128"))
            .unwrap()
            .unwrap();
        assert_eq!(proxy.url(), "http://proxy.local:3128");
    }

    #[test]
    fn explicit_username_without_password_uses_empty_secret() {
        let mut config = active("http://proxy.local:3128");
        config.username = Some("svc".to_owned());
        config.use_default_credentials = true;
        let proxy = ProxyDescriptor::from_config(&config).unwrap().unwrap();
        assert_eq!(
            proxy.credentials(),
            &ProxyCredentials::Explicit {
                username: "svc".to_owned(),
                password: String::new()
            }
        );
    }

    #[test]
    fn default_credentials_when_requested() {
        let mut config = active("http://proxy.local:3128");
        config.use_default_credentials = true;
        let proxy = ProxyDescriptor::from_config(&config).unwrap().unwrap();
        assert_eq!(proxy.credentials(), &ProxyCredentials::Default);

        config.use_default_credentials = false;
        let proxy = ProxyDescriptor::from_config(&config).unwrap().unwrap();
        assert_eq!(proxy.credentials(), &ProxyCredentials::None);
    }

    #[test]
    fn local_hosts_bypass_by_default() {
        let proxy = ProxyDescriptor::from_config(&active("proxy:8080")).unwrap().unwrap();
        assert!(proxy.bypasses("localhost"));
        assert!(proxy.bypasses("127.0.0.1"));
        assert!(proxy.bypasses("[::1]"));
        assert!(proxy.bypasses("intranet"));
        assert!(!proxy.bypasses("graph.example.com"));
    }

    #[test]
    fn bypass_on_local_can_be_disabled() {
        let mut config = active("proxy:8080");
        config.bypass_on_local = false;
        let proxy = ProxyDescriptor::from_config(&config).unwrap().unwrap();
        assert!(!proxy.bypasses("intranet"));
    }

    #[test]
    fn bypass_list_supports_wildcards() {
        let mut config = active("proxy:8080");
        config.bypass_list = vec!["*.corp.local".to_owned(), "10.0.0.?".to_owned()];
        let proxy = ProxyDescriptor::from_config(&config).unwrap().unwrap();
        assert!(proxy.bypasses("api.CORP.local"));
        assert!(proxy.bypasses("10.0.0.7"));
        assert!(!proxy.bypasses("10.0.0.17"));
        assert!(!proxy.bypasses("corp.local.evil.com"));
    }

    #[test]
    fn invalid_proxy_url_is_error() {
        assert!(matches!(
            ProxyDescriptor::from_config(&active("http://")),
            Err(HttpError::Proxy(_))
        ));
    }

    #[test]
    fn converts_to_reqwest_proxy() {
        let mut config = active("proxy.local:3128");
        config.username = Some("svc".to_owned());
        config.password = Some("secret".to_owned());
        let proxy = ProxyDescriptor::from_config(&config).unwrap().unwrap();
        assert!(proxy.to_reqwest().is_ok());
    }

    #[test]
    fn default_credentials_still_build_a_proxy() {
        let mut config = active("proxy.local:3128");
        config.use_default_credentials = true;
        let proxy = ProxyDescriptor::from_config(&config).unwrap().unwrap();
        assert_eq!(proxy.credentials(), &ProxyCredentials::Default);
        assert!(proxy.to_reqwest().is_ok());
    }
}
