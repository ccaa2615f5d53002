mod stage;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::context::{RunContext, RunStatus};
use crate::error::GeoError;
use crate::executor::{emit, OutputRendererPlugin, RenderEvent};

pub use stage::{PipelineHook, PipelineStage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    /// Halted after the named stage via `stop_after`; not a failure.
    Stopped { after: String },
}

/// Ordered stage list with optional post-stage hooks.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn PipelineStage>>,
    hooks: HashMap<String, Arc<dyn PipelineHook>>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, stage: Arc<dyn PipelineStage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Registers a hook for `after_stage`; a second registration replaces it.
    pub fn add_hook(&mut self, after_stage: impl Into<String>, hook: Arc<dyn PipelineHook>) -> &mut Self {
        self.hooks.insert(after_stage.into(), hook);
        self
    }

    pub fn with_renderer(mut self, renderer: Option<Arc<dyn OutputRendererPlugin>>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name() == name)
    }

    /// Runs every stage in order.
    ///
    /// On a stage or hook failure the context is marked failed, the error is
    /// appended as `"[stage] message"`, and the error is returned; no later
    /// stage runs. With `stop_after`, the loop ends after that stage and its
    /// hook, leaving `ctx.status` as `Running`.
    pub async fn run(
        &self,
        ctx: &mut RunContext,
        stop_after: Option<&str>,
    ) -> Result<PipelineOutcome, GeoError> {
        if let Some(name) = stop_after {
            if !self.has_stage(name) {
                return Err(GeoError::Config(format!(
                    "unknown stage '{name}' for stop_after. Valid: {}",
                    self.stage_names().join(", ")
                )));
            }
        }

        ctx.status = RunStatus::Running;
        let run_id = ctx.run_id().to_string();

        for stage in &self.stages {
            let name = stage.name();
            let started = Instant::now();
            info!(target: "geoprobe.pipeline", stage = "pipeline.stage_start", run_id = %run_id, name);
            emit(
                &self.renderer,
                RenderEvent::PhaseStart {
                    run_id: run_id.clone(),
                    phase: name.to_string(),
                    description: stage.description().to_string(),
                },
            );

            let mut result = stage.execute(ctx).await;
            if result.is_ok() {
                if let Some(hook) = self.hooks.get(name) {
                    result = hook.after_stage(name, ctx).await;
                }
            }

            if let Err(err) = result {
                let message = match &err {
                    GeoError::Pipeline { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                error!(target: "geoprobe.pipeline", stage = "pipeline.stage_failed", run_id = %run_id, name, error = %message);
                ctx.mark_failed(format!("[{name}] {message}"));
                return Err(err);
            }

            let duration_ms = started.elapsed().as_millis() as u64;
            info!(target: "geoprobe.pipeline", stage = "pipeline.stage_end", run_id = %run_id, name, duration_ms);
            emit(
                &self.renderer,
                RenderEvent::PhaseEnd {
                    run_id: run_id.clone(),
                    phase: name.to_string(),
                    duration_ms,
                },
            );

            if stop_after == Some(name) {
                info!(target: "geoprobe.pipeline", stage = "pipeline.stopped", run_id = %run_id, after = name);
                return Ok(PipelineOutcome::Stopped {
                    after: name.to_string(),
                });
            }
        }

        ctx.mark_completed();
        Ok(PipelineOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl PipelineStage for Recording {
        fn name(&self) -> &str {
            self.name
        }
        async fn execute(&self, ctx: &mut RunContext) -> Result<(), GeoError> {
            self.log.lock().unwrap().push(self.name.to_string());
            if self.fail {
                return Err(GeoError::pipeline(self.name, "boom"));
            }
            ctx.brand = format!("{}+{}", ctx.brand, self.name);
            Ok(())
        }
    }

    struct Rename;

    #[async_trait]
    impl PipelineHook for Rename {
        async fn after_stage(&self, _stage: &str, ctx: &mut RunContext) -> Result<(), GeoError> {
            ctx.brand.push_str("+hook");
            Ok(())
        }
    }

    fn pipeline(names: &[(&'static str, bool)], log: &Arc<Mutex<Vec<String>>>) -> Pipeline {
        let mut p = Pipeline::new();
        for (name, fail) in names {
            p.add_stage(Arc::new(Recording {
                name: *name,
                log: log.clone(),
                fail: *fail,
            }));
        }
        p
    }

    fn ctx() -> RunContext {
        RunContext::new("run-test", "acme", Arc::new(AppConfig::default()))
    }

    #[tokio::test]
    async fn runs_in_order_and_completes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut p = pipeline(&[("a", false), ("b", false)], &log);
        p.add_hook("a", Arc::new(Rename));
        let mut ctx = ctx();

        let outcome = p.run(&mut ctx, None).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Completed);
        assert_eq!(ctx.status, RunStatus::Completed);
        assert_eq!(ctx.brand, "acme+a+hook+b");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn failure_aborts_and_records_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = pipeline(&[("a", false), ("b", true), ("c", false)], &log);
        let mut ctx = ctx();

        let err = p.run(&mut ctx, None).await.unwrap_err();
        assert!(matches!(err, GeoError::Pipeline { .. }));
        assert_eq!(ctx.status, RunStatus::Failed);
        assert_eq!(ctx.errors(), ["[b] boom".to_string()]);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn stop_after_runs_hook_then_halts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut p = pipeline(&[("a", false), ("b", false)], &log);
        p.add_hook("a", Arc::new(Rename));
        let mut ctx = ctx();

        let outcome = p.run(&mut ctx, Some("a")).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Stopped { after: "a".into() });
        assert_eq!(ctx.status, RunStatus::Running);
        assert_eq!(ctx.brand, "acme+a+hook");
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn unknown_stop_after_is_config_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = pipeline(&[("a", false)], &log);
        let mut ctx = ctx();
        let err = p.run(&mut ctx, Some("nope")).await.unwrap_err();
        assert!(matches!(err, GeoError::Config(_)));
        assert_eq!(ctx.status, RunStatus::Pending);
        assert!(log.lock().unwrap().is_empty());
    }
}
