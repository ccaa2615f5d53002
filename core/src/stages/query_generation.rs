use async_trait::async_trait;
use tracing::info;

use crate::context::{RunContext, Services};
use crate::error::GeoError;
use crate::pipeline::PipelineStage;
use crate::queries::generate_queries;
use crate::storage::{layout, StorageExt};
use crate::types::{BrandProfile, QuerySet};

use super::{skipped, QUERY_GENERATION};

/// Generates the query set from the configured strategies and persists it
/// as `queries.json`.
pub struct QueryGenerationStage {
    services: Services,
}

impl QueryGenerationStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl PipelineStage for QueryGenerationStage {
    fn name(&self) -> &str {
        QUERY_GENERATION
    }

    fn description(&self) -> &str {
        "Generate search queries"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), GeoError> {
        if ctx.query_set.as_ref().is_some_and(|q| !q.is_empty()) {
            skipped(&self.services, ctx.run_id(), QUERY_GENERATION, "query set already loaded");
            return Ok(());
        }

        let profile = match &ctx.brand_profile {
            Some(p) => p.clone(),
            None => BrandProfile {
                name: ctx.brand.clone(),
                category: ctx.brand.clone(),
                competitors: ctx.config.competitors.clone(),
                ..Default::default()
            },
        };

        let cfg = &ctx.config.queries;
        let queries = generate_queries(
            self.services.processing.as_ref(),
            &profile,
            &cfg.strategies,
            cfg.count,
        )
        .await?;

        let set = QuerySet::new(ctx.brand.clone(), queries);
        self.services
            .storage
            .save(ctx.run_id(), layout::QUERIES, &set)
            .await?;
        info!(target: "geoprobe.pipeline", stage = "queries.done", run_id = ctx.run_id(), count = set.total_count);
        ctx.query_set = Some(set);
        Ok(())
    }
}
