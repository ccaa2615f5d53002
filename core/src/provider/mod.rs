//! Provider capability consumed by the execution and processing layers.
//!
//! Concrete HTTP clients live in `geoprobe-plugins`; core only sees the
//! trait, so tests can drive everything with scripted fakes.

mod registry;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::TokenUsage;

pub use registry::ProviderRegistry;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(15);
const HEALTH_CHECK_PROMPT: &str = "Reply with the single word: ok";

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
    pub model: String,
    pub latency_ms: u64,
    pub token_usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub provider: String,
    pub healthy: bool,
    pub latency_ms: u64,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier, used as the provider key in results and file names.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str {
        self.name()
    }

    fn model(&self) -> &str;

    async fn query(&self, prompt: &str) -> Result<ProviderResponse, ProviderError>;

    async fn health_check(&self) -> HealthStatus {
        let start = Instant::now();
        let outcome = tokio::time::timeout(HEALTH_CHECK_TIMEOUT, self.query(HEALTH_CHECK_PROMPT)).await;
        let latency_ms = start.elapsed().as_millis() as u64;
        let (healthy, model, error) = match outcome {
            Ok(Ok(resp)) => (true, resp.model, None),
            Ok(Err(e)) => (false, self.model().to_string(), Some(e.to_string())),
            Err(_) => (
                false,
                self.model().to_string(),
                Some(format!(
                    "health check timed out after {}s",
                    HEALTH_CHECK_TIMEOUT.as_secs()
                )),
            ),
        };
        HealthStatus {
            provider: self.name().to_string(),
            healthy,
            latency_ms,
            model,
            error,
        }
    }
}
