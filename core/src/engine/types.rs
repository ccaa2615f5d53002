use std::sync::Arc;

use crate::config::AppConfig;
use crate::context::RunContext;
use crate::pipeline::{PipelineHook, PipelineOutcome};

pub struct GeoRunArgs {
    pub brand: String,
    pub cfg: AppConfig,
    /// Continue an existing run instead of creating a new one.
    pub resume_run_id: Option<String>,
    /// Stage name after which the run halts.
    pub stop_after: Option<String>,
    pub show_progress: bool,
    /// `(stage name, hook)` pairs installed on the pipeline.
    pub hooks: Vec<(String, Arc<dyn PipelineHook>)>,
}

impl GeoRunArgs {
    pub fn new(brand: impl Into<String>, cfg: AppConfig) -> Self {
        Self {
            brand: brand.into(),
            cfg,
            resume_run_id: None,
            stop_after: None,
            show_progress: false,
            hooks: Vec::new(),
        }
    }
}

pub struct GeoRunOutcome {
    pub outcome: PipelineOutcome,
    pub context: RunContext,
}

impl GeoRunOutcome {
    pub fn run_id(&self) -> &str {
        self.context.run_id()
    }
}
