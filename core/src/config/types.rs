use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzerKind;
use crate::error::GeoError;
use crate::types::QueryStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub competitors: Vec<String>,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub queries: QueryConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_output_dir() -> String {
    "./data/runs".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            brand: None,
            website: None,
            competitors: Vec::new(),
            output_dir: default_output_dir(),
            providers: default_providers(),
            processing: ProcessingConfig::default(),
            execution: ExecutionConfig::default(),
            queries: QueryConfig::default(),
            analysis: AnalysisConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Pre-flight checks; a failure here aborts before any run directory exists.
    pub fn validate(&self) -> Result<(), GeoError> {
        if self.execution.concurrency == 0 {
            return Err(GeoError::Config("execution.concurrency must be >= 1".into()));
        }
        if self.execution.iterations == 0 {
            return Err(GeoError::Config("execution.iterations must be >= 1".into()));
        }
        if self.execution.timeout_ms == 0 {
            return Err(GeoError::Config("execution.timeout_ms must be > 0".into()));
        }
        if self.queries.count == 0 {
            return Err(GeoError::Config("queries.count must be >= 1".into()));
        }
        if self.enabled_providers().next().is_none() {
            return Err(GeoError::Config(
                "no provider configured: enable one under [providers.*] and set its API key".into(),
            ));
        }
        Ok(())
    }

    /// Providers that are enabled and carry an API key.
    pub fn enabled_providers(&self) -> impl Iterator<Item = (&String, &ProviderConfig)> {
        self.providers
            .iter()
            .filter(|(_, p)| p.enabled && p.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()))
    }

    /// Keep only the named providers enabled (CLI `--providers a,b`).
    pub fn restrict_providers(&mut self, names: &[String]) -> Result<(), GeoError> {
        for name in names {
            if !self.providers.contains_key(name) {
                return Err(GeoError::Config(format!(
                    "unknown provider '{name}'. Available: {}",
                    self.providers.keys().cloned().collect::<Vec<_>>().join(", ")
                )));
            }
        }
        for (name, p) in self.providers.iter_mut() {
            p.enabled = names.iter().any(|n| n == name);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_enabled() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

impl ProviderConfig {
    fn preset(model: &str, base_url: Option<&str>) -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: Some(model.to_string()),
            base_url: base_url.map(str::to_string),
            max_tokens: Some(512),
            temperature: default_temperature(),
        }
    }
}

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let presets = [
        ("openai", "gpt-4o-mini", None),
        ("anthropic", "claude-haiku-4-5-20251001", None),
        ("google", "gemini-2.0-flash", None),
        ("perplexity", "sonar", Some("https://api.perplexity.ai")),
        ("chatgpt", "openai/gpt-4o-mini", Some(OPENROUTER_URL)),
        ("gemini", "google/gemini-2.0-flash-001", Some(OPENROUTER_URL)),
        ("claude", "anthropic/claude-3.5-haiku", Some(OPENROUTER_URL)),
        ("deepseek", "deepseek/deepseek-chat", Some(OPENROUTER_URL)),
        ("grok", "x-ai/grok-3-mini", Some(OPENROUTER_URL)),
        ("llama", "meta-llama/llama-3.3-70b-instruct", Some(OPENROUTER_URL)),
    ];
    presets
        .into_iter()
        .map(|(name, model, url)| (name.to_string(), ProviderConfig::preset(model, url)))
        .collect()
}

/// Dedicated provider for non-execution LLM calls (research, query
/// generation, extraction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default = "default_processing_provider")]
    pub provider: String,
    #[serde(default = "default_processing_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_processing_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_processing_provider() -> String {
    "anthropic".to_string()
}

fn default_processing_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_processing_max_tokens() -> u32 {
    4096
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            provider: default_processing_provider(),
            model: default_processing_model(),
            api_key: None,
            base_url: None,
            max_tokens: default_processing_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Extra attempts per task after the first.
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_concurrency() -> usize {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_retry_delay_ms() -> u64 {
    30_000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_iterations() -> u32 {
    1
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            timeout_ms: default_timeout_ms(),
            iterations: default_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_count")]
    pub count: usize,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<QueryStrategy>,
}

fn default_query_count() -> usize {
    20
}

fn default_strategies() -> Vec<QueryStrategy> {
    vec![
        QueryStrategy::Keyword,
        QueryStrategy::Persona,
        QueryStrategy::Intent,
    ]
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            count: default_query_count(),
            strategies: default_strategies(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analyzers")]
    pub analyzers: Vec<AnalyzerKind>,
}

fn default_analyzers() -> Vec<AnalyzerKind> {
    AnalyzerKind::ALL.to_vec()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analyzers: default_analyzers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_formats")]
    pub formats: Vec<ReportFormat>,
}

fn default_report_formats() -> Vec<ReportFormat> {
    vec![ReportFormat::Json, ReportFormat::Markdown]
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            formats: default_report_formats(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "geoprobe_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}
