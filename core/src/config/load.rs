use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{AppConfig, ProcessingConfig};
use crate::error::GeoError;

/// Provider name -> environment variable holding its API key.
pub const ENV_KEY_MAP: &[(&str, &str)] = &[
    ("openai", "OPENAI_API_KEY"),
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("google", "GOOGLE_API_KEY"),
    ("perplexity", "PERPLEXITY_API_KEY"),
    ("openrouter", "OPENROUTER_API_KEY"),
    ("chatgpt", "OPENROUTER_API_KEY"),
    ("gemini", "OPENROUTER_API_KEY"),
    ("claude", "OPENROUTER_API_KEY"),
    ("deepseek", "OPENROUTER_API_KEY"),
    ("grok", "OPENROUTER_API_KEY"),
    ("llama", "OPENROUTER_API_KEY"),
    ("mistral", "OPENROUTER_API_KEY"),
    ("cohere", "OPENROUTER_API_KEY"),
    ("qwen", "OPENROUTER_API_KEY"),
];

/// Order tried when the configured processing provider has no key.
const PROCESSING_FALLBACK: &[&str] = &["anthropic", "openai", "google", "chatgpt"];

/// Get the default geoprobe data directory: ~/.geoprobe
pub fn get_geoprobe_data_dir() -> Result<PathBuf, GeoError> {
    dirs::home_dir()
        .map(|home| home.join(".geoprobe"))
        .ok_or_else(|| GeoError::Config("Cannot determine home directory".into()))
}

pub fn default_config_path() -> Result<PathBuf, GeoError> {
    Ok(get_geoprobe_data_dir()?.join("config.toml"))
}

/// Loads config with priority: ~/.geoprobe/config.toml, then ./geoprobe.toml,
/// then built-in defaults. Environment overrides are applied on top.
pub fn load_default() -> Result<AppConfig, GeoError> {
    let home_config = default_config_path()?;
    let local_config = Path::new("geoprobe.toml");

    let cfg = if home_config.exists() {
        read_toml(&home_config)?
    } else if local_config.exists() {
        read_toml(local_config)?
    } else {
        AppConfig::default()
    };

    finish(cfg)
}

/// Loads an explicit `--config` file; a missing file is a config error.
pub fn load_from_path(path: &Path) -> Result<AppConfig, GeoError> {
    if !path.exists() {
        return Err(GeoError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    finish(read_toml(path)?)
}

fn read_toml(path: &Path) -> Result<AppConfig, GeoError> {
    debug!(target: "geoprobe.config", path = %path.display(), "loading config file");
    let s = std::fs::read_to_string(path)
        .map_err(|e| GeoError::Config(format!("read {}: {e}", path.display())))?;
    toml::from_str::<AppConfig>(&s)
        .map_err(|e| GeoError::Config(format!("parse {}: {e}", path.display())))
}

fn finish(mut cfg: AppConfig) -> Result<AppConfig, GeoError> {
    if cfg
        .logging
        .directory
        .as_ref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        let logs_dir = get_geoprobe_data_dir()?.join("logs");
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
    Ok(cfg)
}

/// Applies environment overrides. `lookup` is injectable for tests.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

    for (name, provider) in cfg.providers.iter_mut() {
        if provider.api_key.is_some() {
            continue;
        }
        if let Some(var) = env_var_for(name) {
            provider.api_key = get(var);
        }
    }

    if let Some(v) = get("GEOPROBE_OUTPUT_DIR") {
        cfg.output_dir = v;
    }
    if let Some(v) = get("PROCESSING_PROVIDER") {
        cfg.processing.provider = v;
    }
    if let Some(v) = get("PROCESSING_MODEL") {
        cfg.processing.model = v;
    }

    resolve_processing(cfg, &get);
}

fn env_var_for(provider: &str) -> Option<&'static str> {
    ENV_KEY_MAP
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, var)| *var)
}

fn resolve_processing<G>(cfg: &mut AppConfig, get: &G)
where
    G: Fn(&str) -> Option<String>,
{
    if cfg.processing.api_key.is_some() {
        return;
    }
    let wanted = cfg.processing.provider.clone();
    if let Some(key) = key_for(cfg, &wanted, get) {
        cfg.processing.api_key = Some(key);
        return;
    }

    for candidate in PROCESSING_FALLBACK {
        if let Some(key) = key_for(cfg, candidate, get) {
            debug!(
                target: "geoprobe.config",
                from = %wanted,
                to = %candidate,
                "processing provider has no key, falling back"
            );
            let model = cfg
                .providers
                .get(*candidate)
                .and_then(|p| p.model.clone())
                .unwrap_or_else(|| cfg.processing.model.clone());
            let base_url = cfg.providers.get(*candidate).and_then(|p| p.base_url.clone());
            cfg.processing = ProcessingConfig {
                provider: candidate.to_string(),
                model,
                api_key: Some(key),
                base_url,
                ..cfg.processing.clone()
            };
            return;
        }
    }
}

fn key_for<G>(cfg: &AppConfig, provider: &str, get: &G) -> Option<String>
where
    G: Fn(&str) -> Option<String>,
{
    cfg.providers
        .get(provider)
        .and_then(|p| p.api_key.clone())
        .or_else(|| env_var_for(provider).and_then(get))
}
