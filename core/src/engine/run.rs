use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::context::{RunContext, Services};
use crate::error::GeoError;
use crate::executor::{emit, RenderEvent};
use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::stages::{
    AnalysisStage, ExecutionStage, QueryGenerationStage, ReportingStage, ResearchStage, STAGE_NAMES,
};

use super::post::{final_status, finish_metadata, metadata};
use super::pre::prepare_context;
use super::types::{GeoRunArgs, GeoRunOutcome};

/// The five-stage single-brand pipeline.
pub fn build_pipeline(services: &Services, show_progress: bool) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline
        .add_stage(Arc::new(ResearchStage::new(services.clone())))
        .add_stage(Arc::new(QueryGenerationStage::new(services.clone())))
        .add_stage(Arc::new(ExecutionStage::new(services.clone(), show_progress)))
        .add_stage(Arc::new(AnalysisStage::new(services.clone())))
        .add_stage(Arc::new(ReportingStage::new(services.clone())));
    pipeline.with_renderer(services.renderer.clone())
}

pub struct GeoEngine {
    services: Services,
}

impl GeoEngine {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Runs (or resumes) one brand study.
    ///
    /// `metadata.json` is written when the run starts and again when it
    /// ends, with `completed`, `stopped-after-<stage>` or `failed`.
    pub async fn run(&self, args: GeoRunArgs) -> Result<GeoRunOutcome, GeoError> {
        let GeoRunArgs {
            brand,
            cfg,
            resume_run_id,
            stop_after,
            show_progress,
            hooks,
        } = args;

        if let Some(name) = stop_after.as_deref() {
            if !STAGE_NAMES.contains(&name) {
                return Err(GeoError::Config(format!(
                    "unknown stage '{name}' for stop_after. Valid: {}",
                    STAGE_NAMES.join(", ")
                )));
            }
        }

        let storage = self.services.storage.as_ref();
        let mut ctx = prepare_context(storage, &brand, Arc::new(cfg), resume_run_id.as_deref()).await?;
        storage.save_metadata(&metadata(&ctx, "running")).await?;

        let mut pipeline = build_pipeline(&self.services, show_progress);
        for (stage, hook) in hooks {
            pipeline.add_hook(stage, hook);
        }

        let started = Instant::now();
        emit(
            &self.services.renderer,
            RenderEvent::RunStart {
                run_id: ctx.run_id().to_string(),
                kind: "run".into(),
                subject: ctx.brand.clone(),
            },
        );
        info!(target: "geoprobe.pipeline", stage = "run.start", run_id = ctx.run_id(), brand = %ctx.brand);

        let result = pipeline.run(&mut ctx, stop_after.as_deref()).await;
        let status = final_status(result.as_ref().ok());
        finish_metadata(storage, &ctx, &status).await;
        self.emit_end(&ctx, &status, started, result.as_ref().ok());

        match result {
            Ok(outcome) => {
                info!(target: "geoprobe.pipeline", stage = "run.end", run_id = ctx.run_id(), status = %status);
                Ok(GeoRunOutcome {
                    outcome,
                    context: ctx,
                })
            }
            Err(err) => {
                error!(target: "geoprobe.pipeline", stage = "run.failed", run_id = ctx.run_id(), error = %err);
                Err(err)
            }
        }
    }

    fn emit_end(&self, ctx: &RunContext, status: &str, started: Instant, outcome: Option<&PipelineOutcome>) {
        let run_id = ctx.run_id().to_string();
        if let Some(PipelineOutcome::Stopped { after }) = outcome {
            emit(
                &self.services.renderer,
                RenderEvent::Stopped {
                    run_id: run_id.clone(),
                    after: after.clone(),
                },
            );
        }
        emit(
            &self.services.renderer,
            RenderEvent::RunEnd {
                run_id,
                status: status.to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
                errors: ctx.errors().to_vec(),
            },
        );
    }
}
