use async_trait::async_trait;

use crate::context::{RunContext, Services};
use crate::error::GeoError;
use crate::executor::{ExecutionEngine, ExecutionOpts};
use crate::pipeline::PipelineStage;

use super::{skipped, EXECUTION};

/// Fans the query set out over every enabled provider.
pub struct ExecutionStage {
    services: Services,
    show_progress: bool,
}

impl ExecutionStage {
    pub fn new(services: Services, show_progress: bool) -> Self {
        Self {
            services,
            show_progress,
        }
    }
}

#[async_trait]
impl PipelineStage for ExecutionStage {
    fn name(&self) -> &str {
        EXECUTION
    }

    fn description(&self) -> &str {
        "Query every provider"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), GeoError> {
        if ctx.execution_run.as_ref().is_some_and(|r| !r.results.is_empty()) {
            skipped(&self.services, ctx.run_id(), EXECUTION, "results already collected");
            return Ok(());
        }

        let queries = match &ctx.query_set {
            Some(set) if !set.is_empty() => &set.queries,
            _ => return Err(GeoError::pipeline(EXECUTION, "no queries generated")),
        };
        let providers = self.services.providers.enabled();

        let mut opts = ExecutionOpts::from_config(&ctx.config.execution);
        opts.show_progress = self.show_progress;
        let engine = ExecutionEngine::builder(opts, self.services.storage.clone())
            .maybe_renderer(self.services.renderer.clone())
            .maybe_retry_strategy(self.services.retry_strategy.clone())
            .build();

        let run = engine
            .execute(ctx.run_id(), &ctx.brand, queries, &providers)
            .await?;
        ctx.execution_run = Some(run);
        Ok(())
    }
}
