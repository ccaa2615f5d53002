//! ServicesFactory implementation: builds storage, providers and the retry
//! strategy from config so the CLI commands share one wiring path.
use std::sync::Arc;

use async_trait::async_trait;
use geoprobe_core::api::{AppConfig, FileSystemStorage, GeoError, Services, ServicesFactory};

use crate::factory;

pub struct PluginServicesFactory {
    output_format: String,
}

impl PluginServicesFactory {
    pub fn new(output_format: impl Into<String>) -> Self {
        Self {
            output_format: output_format.into(),
        }
    }
}

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self::new("text")
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, GeoError> {
        let providers = factory::build_registry(cfg).map_err(|e| GeoError::Config(e.to_string()))?;
        let processing = factory::build_processing(cfg).map_err(|e| GeoError::Config(e.to_string()))?;
        tracing::debug!(
            target: "geoprobe.config",
            providers = ?providers.names(),
            processing = %processing.name(),
            "services built"
        );
        Ok(Services {
            storage: Arc::new(FileSystemStorage::new(&cfg.output_dir)),
            processing,
            providers: Arc::new(providers),
            renderer: factory::build_renderer(&self.output_format),
            retry_strategy: factory::build_retry_strategy(&cfg.execution),
        })
    }
}
