use std::time::Instant;

use async_trait::async_trait;
use geoprobe_core::api::{Provider, ProviderError, ProviderResponse, TokenUsage};
use serde::Deserialize;
use serde_json::json;

use super::http::{client, from_reqwest, preview_body, read_success_body};
use super::HttpProviderConfig;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// Any endpoint speaking the OpenAI chat-completions protocol: OpenAI,
/// Google's compatibility endpoint, Perplexity and OpenRouter.
pub struct OpenAiCompatProvider {
    cfg: HttpProviderConfig,
    url: String,
    http: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(cfg: HttpProviderConfig) -> anyhow::Result<Self> {
        let url = format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'));
        let http = client(cfg.timeout_ms)?;
        Ok(Self { cfg, url, http })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.cfg.name
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }

    async fn query(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        let name = self.cfg.name.as_str();
        let timeout_ms = self.cfg.timeout_ms;
        let body = json!({
            "model": self.cfg.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.cfg.max_tokens,
            "temperature": self.cfg.temperature,
        });

        tracing::debug!(target: "geoprobe.provider", stage = "provider.request", provider = name, url = %self.url, prompt_len = prompt.len());
        let started = Instant::now();
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(name, timeout_ms, e))?;
        let text = read_success_body(name, timeout_ms, resp).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::request(name, format!("invalid response: {e} | body={}", preview_body(&text)))
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::request(name, "empty completion"))?;

        Ok(ProviderResponse {
            text: content,
            model: parsed.model.unwrap_or_else(|| self.cfg.model.clone()),
            latency_ms,
            token_usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}
