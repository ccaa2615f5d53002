use async_trait::async_trait;

use crate::context::RunContext;
use crate::error::GeoError;

/// One named step of a run. `name()` is the string matched by `stop_after`
/// and by hook registration, so it must stay stable.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), GeoError>;
}

/// Callback run after a named stage completes, e.g. an interactive review.
/// It may mutate the context but cannot reorder stages.
#[async_trait]
pub trait PipelineHook: Send + Sync {
    async fn after_stage(&self, stage: &str, ctx: &mut RunContext) -> Result<(), GeoError>;
}
