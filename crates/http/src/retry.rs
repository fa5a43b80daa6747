//! 재시도 정책
//!
//! `GET` 요청이 5xx 응답을 받았을 때만 재시도합니다. 다른 메서드나 5xx가 아닌
//! 실패, 연결 실패는 재시도하지 않습니다.
//!
//! 지연: `base * 2^(attempt-1) + random(0..=max_jitter)`
//! (기본값 기준 400ms, 800ms, ...)

use std::time::Duration;

use invcollect_core::config::HttpConfig;
use rand::Rng;

use crate::transport::Method;

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 시도를 포함한 최대 시도 횟수
    pub max_attempts: u32,
    /// 지수 백오프 기준 지연
    pub base_delay: Duration,
    /// 최대 지터
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(400),
            max_jitter: Duration::from_millis(150),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// 재시도하지 않는 정책
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// 재시도 대상인 응답인지 판단합니다 (시도 횟수는 보지 않음).
    pub fn is_retryable(method: Method, status: u16) -> bool {
        method == Method::Get && (500..=599).contains(&status)
    }

    /// `attempt`번째 시도(1부터)가 끝난 뒤 다시 시도해야 하는지 판단합니다.
    pub fn should_retry(&self, method: Method, status: u16, attempt: u32) -> bool {
        attempt < self.max_attempts && Self::is_retryable(method, status)
    }

    /// `attempt`번째 시도 후의 지터 없는 지연
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// `attempt`번째 시도 후의 지연 (지터 포함)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ms)
        };
        self.base_backoff(attempt) + Duration::from_millis(jitter)
    }
}
