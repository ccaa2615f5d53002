use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::context::{new_run_id, RunContext};
use crate::error::GeoError;
use crate::storage::{layout, Storage, StorageExt};
use crate::types::{BrandProfile, ExecutionRun, QuerySet, RunMetadata};

/// Creates a fresh run directory, or rebuilds the context of an existing run
/// purely from its checkpoint files.
pub(crate) async fn prepare_context(
    storage: &dyn Storage,
    brand: &str,
    cfg: Arc<AppConfig>,
    resume_run_id: Option<&str>,
) -> Result<RunContext, GeoError> {
    let Some(run_id) = resume_run_id else {
        let run_id = new_run_id("run");
        storage.create_run_dir(&run_id).await?;
        info!(target: "geoprobe.pipeline", stage = "run.created", run_id = %run_id, brand);
        return Ok(RunContext::new(run_id, brand, cfg));
    };

    if !storage.run_exists(run_id).await {
        return Err(GeoError::RunNotFound(run_id.to_string()));
    }

    let meta: Option<RunMetadata> = storage.load(run_id, layout::METADATA).await?;
    let brand = meta
        .and_then(|m| m.brand)
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| brand.to_string());
    let mut ctx = RunContext::new(run_id, brand, cfg);

    ctx.brand_profile = storage.load::<BrandProfile>(run_id, layout::BRAND_PROFILE).await?;
    ctx.query_set = storage
        .load::<QuerySet>(run_id, layout::QUERIES)
        .await?
        .filter(|q| !q.is_empty());
    ctx.execution_run = storage
        .load::<ExecutionRun>(run_id, layout::RESULTS)
        .await?
        .filter(|r| !r.results.is_empty());

    info!(
        target: "geoprobe.pipeline",
        stage = "run.resumed",
        run_id,
        brand = %ctx.brand,
        has_profile = ctx.brand_profile.is_some(),
        queries = ctx.query_set.as_ref().map_or(0, |q| q.total_count),
        results = ctx.execution_run.as_ref().map_or(0, |r| r.results.len())
    );
    Ok(ctx)
}
