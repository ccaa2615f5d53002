use tracing::warn;

use crate::context::RunContext;
use crate::pipeline::PipelineOutcome;
use crate::storage::Storage;
use crate::types::RunMetadata;

pub(crate) fn metadata(ctx: &RunContext, status: &str) -> RunMetadata {
    let mut meta = RunMetadata::new(ctx.run_id(), "run", ctx.started_at.clone());
    meta.brand = Some(ctx.brand.clone());
    meta.category = ctx
        .brand_profile
        .as_ref()
        .map(|p| p.category.clone())
        .filter(|c| !c.is_empty());
    meta.errors = ctx.errors().to_vec();
    meta.status = status.to_string();
    meta
}

/// Status string persisted for a finished pipeline.
pub(crate) fn final_status(outcome: Option<&PipelineOutcome>) -> String {
    match outcome {
        Some(PipelineOutcome::Completed) => "completed".to_string(),
        Some(PipelineOutcome::Stopped { after }) => format!("stopped-after-{after}"),
        None => "failed".to_string(),
    }
}

/// Writes the closing `metadata.json`. A failure here is logged, not raised,
/// so it cannot mask the pipeline's own error.
pub(crate) async fn finish_metadata(storage: &dyn Storage, ctx: &RunContext, status: &str) {
    let meta = metadata(ctx, status).finish(status);
    if let Err(error) = storage.save_metadata(&meta).await {
        warn!(target: "geoprobe.storage", stage = "metadata.write_failed", run_id = ctx.run_id(), %error);
    }
}
