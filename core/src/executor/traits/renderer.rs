use serde::Serialize;

/// Sink for user-facing run events. Injected into engines instead of
/// printing from core.
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn supports_streaming(&self) -> bool {
        false
    }
    fn render(&self, event: &RenderEvent);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        kind: String,
        subject: String,
    },
    PhaseStart {
        run_id: String,
        phase: String,
        description: String,
    },
    PhaseSkipped {
        run_id: String,
        phase: String,
        reason: String,
    },
    PhaseEnd {
        run_id: String,
        phase: String,
        duration_ms: u64,
    },
    TaskComplete {
        run_id: String,
        provider: String,
        query_id: String,
        iteration: u32,
        success: bool,
        latency_ms: u64,
        attempts: u32,
        done: usize,
        total: usize,
    },
    BrandAnalyzed {
        run_id: String,
        brand: String,
        overall_score: f64,
    },
    Stopped {
        run_id: String,
        after: String,
    },
    RunEnd {
        run_id: String,
        status: String,
        duration_ms: u64,
        errors: Vec<String>,
    },
}

impl RenderEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStart { run_id, .. }
            | Self::PhaseStart { run_id, .. }
            | Self::PhaseSkipped { run_id, .. }
            | Self::PhaseEnd { run_id, .. }
            | Self::TaskComplete { run_id, .. }
            | Self::BrandAnalyzed { run_id, .. }
            | Self::Stopped { run_id, .. }
            | Self::RunEnd { run_id, .. } => run_id,
        }
    }
}

/// Convenience for optional renderers threaded through engines.
pub fn emit(renderer: &Option<std::sync::Arc<dyn OutputRendererPlugin>>, event: RenderEvent) {
    if let Some(r) = renderer {
        r.render(&event);
    }
}
