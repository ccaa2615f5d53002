use std::sync::Arc;

use anyhow::{anyhow, Result};

use geoprobe_core::api::{
    AppConfig, ExecutionConfig, OutputRendererPlugin, Provider, ProviderConfig, ProviderRegistry,
    RetryStrategyPlugin,
};

use crate::executor::{ExponentialBackoffPlugin, JsonlRendererPlugin, RetryConfig, TextRendererPlugin};
use crate::providers::{AnthropicProvider, HttpProviderConfig, OpenAiCompatProvider, ANTHROPIC_BASE_URL};

const DEFAULT_MAX_TOKENS: u32 = 512;

fn default_base_url(name: &str) -> Option<&'static str> {
    match name {
        "openai" => Some("https://api.openai.com/v1"),
        "google" => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
        "perplexity" => Some("https://api.perplexity.ai"),
        "anthropic" => Some(ANTHROPIC_BASE_URL),
        _ => None,
    }
}

fn build_http(cfg: HttpProviderConfig) -> Result<Arc<dyn Provider>> {
    // Only the native Anthropic endpoint speaks the Messages API; everything
    // else, including OpenRouter's `anthropic/*` models, is chat-completions.
    if cfg.base_url.trim_end_matches('/') == ANTHROPIC_BASE_URL {
        Ok(Arc::new(AnthropicProvider::new(cfg)?))
    } else {
        Ok(Arc::new(OpenAiCompatProvider::new(cfg)?))
    }
}

pub fn build_provider(name: &str, cfg: &ProviderConfig, timeout_ms: u64) -> Result<Arc<dyn Provider>> {
    let api_key = cfg
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow!("provider '{name}' has no API key"))?;
    let base_url = cfg
        .base_url
        .clone()
        .or_else(|| default_base_url(name).map(str::to_string))
        .ok_or_else(|| anyhow!("provider '{name}' needs a base_url"))?;
    let model = cfg
        .model
        .clone()
        .ok_or_else(|| anyhow!("provider '{name}' needs a model"))?;

    build_http(HttpProviderConfig {
        name: name.to_string(),
        model,
        api_key,
        base_url,
        max_tokens: cfg.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature: cfg.temperature,
        timeout_ms,
    })
}

/// Every enabled, keyed provider in config order.
pub fn build_registry(cfg: &AppConfig) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for (name, p) in cfg.enabled_providers() {
        registry.register(build_provider(name, p, cfg.execution.timeout_ms)?);
    }
    if registry.is_empty() {
        return Err(anyhow!("no provider configured"));
    }
    Ok(registry)
}

/// The processing provider gets a longer timeout than execution calls; its
/// prompts ask for whole JSON documents.
pub fn build_processing(cfg: &AppConfig) -> Result<Arc<dyn Provider>> {
    let p = &cfg.processing;
    let api_key = p
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow!("no API key for processing provider '{}'", p.provider))?;
    let base_url = p
        .base_url
        .clone()
        .or_else(|| cfg.providers.get(&p.provider).and_then(|c| c.base_url.clone()))
        .or_else(|| default_base_url(&p.provider).map(str::to_string))
        .ok_or_else(|| anyhow!("processing provider '{}' needs a base_url", p.provider))?;

    build_http(HttpProviderConfig {
        name: p.provider.clone(),
        model: p.model.clone(),
        api_key,
        base_url,
        max_tokens: p.max_tokens,
        temperature: p.temperature,
        timeout_ms: cfg.execution.timeout_ms.saturating_mul(4),
    })
}

pub fn build_retry_strategy(cfg: &ExecutionConfig) -> Option<Arc<dyn RetryStrategyPlugin>> {
    if cfg.retries == 0 {
        return None;
    }
    Some(Arc::new(ExponentialBackoffPlugin::new(RetryConfig::from_execution(cfg))))
}

pub fn build_renderer(format: &str) -> Option<Arc<dyn OutputRendererPlugin>> {
    match format {
        "jsonl" => Some(Arc::new(JsonlRendererPlugin::new(false))),
        "none" | "quiet" => None,
        // Preserve existing behavior: anything else renders as text.
        _ => Some(Arc::new(TextRendererPlugin::new(false))),
    }
}
