//! Concrete `Provider` implementations over HTTP.

mod anthropic;
mod http;
mod openai_compat;

pub use anthropic::{AnthropicProvider, ANTHROPIC_BASE_URL};
pub use openai_compat::OpenAiCompatProvider;

/// Connection settings shared by every HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Registry name, e.g. `openai` or an alias such as `chatgpt`.
    pub name: String,
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}
