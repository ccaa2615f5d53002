use thiserror::Error;

/// Failure of a single provider call.
///
/// Inside the execution fan-out these are recovered locally and recorded on
/// the task's `QueryResult`; everywhere else they abort the current stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("[{provider}] {message}")]
    Request { provider: String, message: String },

    #[error("[{provider}] rate limited: {message}")]
    RateLimit {
        provider: String,
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("[{provider}] request timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },
}

impl ProviderError {
    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout_ms,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::Request { provider, .. }
            | Self::RateLimit { provider, .. }
            | Self::Timeout { provider, .. } => provider,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Request { .. } => "PROVIDER_ERROR",
            Self::RateLimit { .. } => "RATE_LIMIT_ERROR",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit { .. } | Self::Timeout { .. } => true,
            // 4xx other than 429 will not get better on a second attempt
            Self::Request { message, .. } => !message.contains("HTTP 4"),
        }
    }
}
