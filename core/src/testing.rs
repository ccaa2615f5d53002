//! Scripted provider for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::provider::{Provider, ProviderResponse};

/// Replies with the first rule whose needle occurs in the prompt; prompts
/// matching no rule fail with a request error.
pub struct ScriptedLlm {
    rules: Vec<(String, Result<String, String>)>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, needle: &str, text: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(text.to_string())));
        self
    }

    pub fn fail(mut self, needle: &str, message: &str) -> Self {
        self.rules.push((needle.to_string(), Err(message.to_string())));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn query(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let rule = self.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str()));
        match rule {
            Some((_, Ok(text))) => Ok(ProviderResponse {
                text: text.clone(),
                model: "scripted-1".into(),
                latency_ms: 1,
                token_usage: None,
            }),
            Some((_, Err(msg))) => Err(ProviderError::request("scripted", msg.clone())),
            None => Err(ProviderError::request("scripted", "no scripted reply")),
        }
    }
}
