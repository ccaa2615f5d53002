use std::time::Duration;

use geoprobe_core::api::{ExecutionConfig, ProviderError, RetryStrategyPlugin};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Total attempts including the first.
    pub max_attempts: u32,
}

impl RetryConfig {
    pub fn from_execution(cfg: &ExecutionConfig) -> Self {
        Self {
            base_delay_ms: cfg.retry_delay_ms,
            max_delay_ms: cfg.max_retry_delay_ms.max(cfg.retry_delay_ms),
            max_attempts: cfg.retries.saturating_add(1),
        }
    }
}

pub struct ExponentialBackoffPlugin {
    config: RetryConfig,
}

pub struct LinearRetryPlugin {
    config: RetryConfig,
}

impl ExponentialBackoffPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl LinearRetryPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryStrategyPlugin for ExponentialBackoffPlugin {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32, _error: &ProviderError) -> Option<Duration> {
        if attempt == 0 || attempt >= self.config.max_attempts {
            return None;
        }
        let exp = 1u64 << (attempt - 1).min(30);
        let delay = self.config.base_delay_ms.saturating_mul(exp);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

impl RetryStrategyPlugin for LinearRetryPlugin {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32, _error: &ProviderError) -> Option<Duration> {
        if attempt == 0 || attempt >= self.config.max_attempts {
            return None;
        }
        let delay = self.config.base_delay_ms.saturating_mul(attempt as u64);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err() -> ProviderError {
        ProviderError::timeout("openai", 100)
    }

    #[test]
    fn test_exponential_backoff() {
        let plugin = ExponentialBackoffPlugin::new(RetryConfig {
            base_delay_ms: 100,
            max_delay_ms: 300,
            max_attempts: 4,
        });
        assert_eq!(plugin.next_delay(1, &err()).unwrap().as_millis(), 100);
        assert_eq!(plugin.next_delay(2, &err()).unwrap().as_millis(), 200);
        assert_eq!(plugin.next_delay(3, &err()).unwrap().as_millis(), 300);
        assert_eq!(plugin.next_delay(4, &err()), None);
    }

    #[test]
    fn test_linear_backoff() {
        let plugin = LinearRetryPlugin::new(RetryConfig {
            base_delay_ms: 50,
            max_delay_ms: 200,
            max_attempts: 4,
        });
        assert_eq!(plugin.next_delay(1, &err()).unwrap().as_millis(), 50);
        assert_eq!(plugin.next_delay(3, &err()).unwrap().as_millis(), 150);
    }

    #[test]
    fn non_retryable_errors_stop_immediately() {
        let plugin = ExponentialBackoffPlugin::new(RetryConfig {
            base_delay_ms: 10,
            max_delay_ms: 10,
            max_attempts: 3,
        });
        let auth = ProviderError::request("openai", "HTTP 401: bad key");
        assert!(!plugin.should_retry(1, &auth));
        assert!(plugin.should_retry(1, &err()));
        assert!(!plugin.should_retry(3, &err()));
    }

    #[test]
    fn config_counts_first_attempt() {
        let cfg = RetryConfig::from_execution(&ExecutionConfig {
            retries: 2,
            retry_delay_ms: 500,
            max_retry_delay_ms: 100,
            ..ExecutionConfig::default()
        });
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.max_delay_ms, 500);
    }
}
