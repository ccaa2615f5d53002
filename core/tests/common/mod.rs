#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use geoprobe_core::api::{
    FileSystemStorage, Provider, ProviderError, ProviderRegistry, ProviderResponse,
    RetryStrategyPlugin, Services, Storage, StorageError,
};
use serde_json::Value;
use geoprobe_core::types::{GeneratedQuery, QueryCategory, QueryStrategy};

/// Execution-side fake with instrumentation: total calls, in-flight count
/// and its high-water mark.
pub struct FakeProvider {
    name: String,
    reply: String,
    delay: Duration,
    /// Prompts containing this needle sleep far past any test timeout.
    hang_on: Option<String>,
    /// Prompts containing this needle fail with a non-retryable error.
    reject_on: Option<String>,
    /// The first N calls fail with a retryable timeout.
    transient_failures: AtomicU32,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl FakeProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: "1. Acme is the best choice. 2. Globex is a solid alternative.".to_string(),
            delay: Duration::ZERO,
            hang_on: None,
            reject_on: None,
            transient_failures: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }

    pub fn reply(mut self, text: &str) -> Self {
        self.reply = text.to_string();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn hang_on(mut self, needle: &str) -> Self {
        self.hang_on = Some(needle.to_string());
        self
    }

    pub fn reject_on(mut self, needle: &str) -> Self {
        self.reject_on = Some(needle.to_string());
        self
    }

    pub fn fail_first(self, n: u32) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn query(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        let outcome = async {
            if self.hang_on.as_deref().is_some_and(|n| prompt.contains(n)) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.reject_on.as_deref().is_some_and(|n| prompt.contains(n)) {
                return Err(ProviderError::request(&self.name, "HTTP 400: rejected"));
            }
            let transient = self
                .transient_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if transient {
                return Err(ProviderError::timeout(&self.name, 1));
            }
            Ok(ProviderResponse {
                text: self.reply.clone(),
                model: "fake-model".to_string(),
                latency_ms: self.delay.as_millis() as u64,
                token_usage: None,
            })
        }
        .await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Processing-side fake: answers with the first rule whose needle occurs in
/// the prompt; unmatched prompts fail.
pub struct ScriptedProcessing {
    rules: Vec<(String, String)>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProcessing {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, needle: &str, text: &str) -> Self {
        self.rules.push((needle.to_string(), text.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }
}

#[async_trait]
impl Provider for ScriptedProcessing {
    fn name(&self) -> &str {
        "processing"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn query(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let text = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, text)| text.clone())
            .ok_or_else(|| ProviderError::request("processing", "no scripted reply"))?;
        Ok(ProviderResponse {
            text,
            model: "scripted".to_string(),
            latency_ms: 0,
            token_usage: None,
        })
    }
}

/// Retries every retryable error immediately.
pub struct ImmediateRetry(pub u32);

impl RetryStrategyPlugin for ImmediateRetry {
    fn name(&self) -> &str {
        "immediate"
    }

    fn next_delay(&self, _attempt: u32, _error: &ProviderError) -> Option<Duration> {
        Some(Duration::ZERO)
    }

    fn max_attempts(&self) -> u32 {
        self.0
    }
}

/// Filesystem storage whose saves fail for paths containing `needle`.
pub struct FailingSaves {
    inner: FileSystemStorage,
    needle: String,
}

impl FailingSaves {
    pub fn new(root: &std::path::Path, needle: &str) -> Self {
        Self {
            inner: FileSystemStorage::new(root),
            needle: needle.to_string(),
        }
    }
}

#[async_trait]
impl Storage for FailingSaves {
    async fn save_json(&self, run_id: &str, rel: &str, value: &Value) -> Result<(), StorageError> {
        if rel.contains(&self.needle) {
            return Err(StorageError::Io {
                path: self.inner.run_dir(run_id).join(rel),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.save_json(run_id, rel, value).await
    }

    async fn load_json(&self, run_id: &str, rel: &str) -> Result<Option<Value>, StorageError> {
        self.inner.load_json(run_id, rel).await
    }

    async fn save_text(&self, run_id: &str, rel: &str, text: &str) -> Result<(), StorageError> {
        self.inner.save_text(run_id, rel, text).await
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.inner.run_dir(run_id)
    }

    async fn list_runs(&self) -> Result<Vec<String>, StorageError> {
        self.inner.list_runs().await
    }

    async fn create_run_dir(&self, run_id: &str) -> Result<PathBuf, StorageError> {
        self.inner.create_run_dir(run_id).await
    }

    async fn run_exists(&self, run_id: &str) -> bool {
        self.inner.run_exists(run_id).await
    }
}

pub fn storage(root: &std::path::Path) -> Arc<dyn Storage> {
    Arc::new(FileSystemStorage::new(root))
}

pub fn services(
    root: &std::path::Path,
    processing: Arc<dyn Provider>,
    providers: Vec<Arc<dyn Provider>>,
) -> Services {
    let mut registry = ProviderRegistry::new();
    for p in providers {
        registry.register(p);
    }
    Services {
        storage: storage(root),
        processing,
        providers: Arc::new(registry),
        renderer: None,
        retry_strategy: None,
    }
}

pub fn queries(texts: &[&str]) -> Vec<GeneratedQuery> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| GeneratedQuery {
            id: format!("q{}", i + 1),
            text: text.to_string(),
            category: QueryCategory::Recommendation,
            strategy: QueryStrategy::Keyword,
            intent: "discovery".to_string(),
            persona: None,
        })
        .collect()
}
