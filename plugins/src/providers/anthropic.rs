use std::time::Instant;

use async_trait::async_trait;
use geoprobe_core::api::{Provider, ProviderError, ProviderResponse, TokenUsage};
use serde::Deserialize;
use serde_json::json;

use super::http::{client, from_reqwest, preview_body, read_success_body};
use super::HttpProviderConfig;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Anthropic Messages API.
pub struct AnthropicProvider {
    cfg: HttpProviderConfig,
    url: String,
    http: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(cfg: HttpProviderConfig) -> anyhow::Result<Self> {
        let url = format!("{}/v1/messages", cfg.base_url.trim_end_matches('/'));
        let http = client(cfg.timeout_ms)?;
        Ok(Self { cfg, url, http })
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.cfg.name
    }

    fn display_name(&self) -> &str {
        "Anthropic"
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }

    async fn query(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        let name = self.cfg.name.as_str();
        let timeout_ms = self.cfg.timeout_ms;
        let body = json!({
            "model": self.cfg.model,
            "max_tokens": self.cfg.max_tokens,
            "temperature": self.cfg.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        tracing::debug!(target: "geoprobe.provider", stage = "provider.request", provider = name, url = %self.url, prompt_len = prompt.len());
        let started = Instant::now();
        let resp = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.cfg.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(name, timeout_ms, e))?;
        let text = read_success_body(name, timeout_ms, resp).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let parsed: MessagesResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::request(name, format!("invalid response: {e} | body={}", preview_body(&text)))
        })?;
        let content: String = parsed
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        if content.trim().is_empty() {
            return Err(ProviderError::request(name, "empty completion"));
        }

        Ok(ProviderResponse {
            text: content,
            model: parsed.model.unwrap_or_else(|| self.cfg.model.clone()),
            latency_ms,
            token_usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn joins_text_blocks_and_sums_usage() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .with_status(200)
            .with_body(
                r#"{"model":"claude-x","content":[{"type":"text","text":"Acme "},{"type":"tool_use","id":"t"},{"type":"text","text":"wins"}],
                   "usage":{"input_tokens":3,"output_tokens":2}}"#,
            )
            .create_async()
            .await;

        let provider = AnthropicProvider::new(HttpProviderConfig {
            name: "anthropic".into(),
            model: "claude-x".into(),
            api_key: "key".into(),
            base_url: server.url(),
            max_tokens: 32,
            temperature: 0.0,
            timeout_ms: 2_000,
        })
        .unwrap();
        let resp = provider.query("who wins?").await.unwrap();
        assert_eq!(resp.text, "Acme wins");
        assert_eq!(resp.token_usage.unwrap().total_tokens, 5);
    }
}
