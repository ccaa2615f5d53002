use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::GeoError;
use crate::executor::{OutputRendererPlugin, RetryStrategyPlugin};
use crate::provider::{Provider, ProviderRegistry};
use crate::storage::Storage;
use crate::types::{AnalysisResult, BrandProfile, ExecutionRun, QuerySet};

/// Collaborators shared by every stage and phase of a run.
#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn Storage>,
    /// Provider used for research, query generation and extraction calls.
    pub processing: Arc<dyn Provider>,
    /// Providers queried during execution.
    pub providers: Arc<ProviderRegistry>,
    pub renderer: Option<Arc<dyn OutputRendererPlugin>>,
    pub retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, GeoError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a sortable run id: `{prefix}-YYYYmmdd-HHMMSS-xxxxxx`.
pub fn new_run_id(prefix: &str) -> String {
    let ts = Utc::now().format("%Y%m%d-%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{ts}-{}", &suffix[..6])
}

/// Mutable state threaded through every stage of one run.
///
/// The pipeline owns it for the duration of a run. `run_id` is fixed at
/// construction; `errors` is only ever appended to.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    pub config: Arc<AppConfig>,
    pub brand: String,
    pub status: RunStatus,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub brand_profile: Option<BrandProfile>,
    pub query_set: Option<QuerySet>,
    pub execution_run: Option<ExecutionRun>,
    pub analysis_result: Option<AnalysisResult>,
    errors: Vec<String>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, brand: impl Into<String>, config: Arc<AppConfig>) -> Self {
        Self {
            run_id: run_id.into(),
            config,
            brand: brand.into(),
            status: RunStatus::Pending,
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
            brand_profile: None,
            query_set: None,
            execution_run: None,
            analysis_result: None,
            errors: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn mark_completed(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now().to_rfc3339());
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now().to_rfc3339());
        self.push_error(message);
    }

    /// Competitors from the researched profile, falling back to config.
    pub fn competitors(&self) -> Vec<String> {
        match &self.brand_profile {
            Some(p) if !p.competitors.is_empty() => p.competitors.clone(),
            _ => self.config.competitors.clone(),
        }
    }
}
