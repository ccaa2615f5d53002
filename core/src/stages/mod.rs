//! Named stages of a single-brand run, in execution order:
//! `research`, `query-generation`, `execution`, `analysis`, `reporting`.

mod analysis;
mod execution;
mod query_generation;
mod reporting;
mod research;

use crate::context::Services;
use crate::executor::{emit, RenderEvent};

pub use analysis::AnalysisStage;
pub use execution::ExecutionStage;
pub use query_generation::QueryGenerationStage;
pub use reporting::ReportingStage;
pub use research::{ResearchStage, RESEARCH_PROMPT_MARKER};

pub const RESEARCH: &str = "research";
pub const QUERY_GENERATION: &str = "query-generation";
pub const EXECUTION: &str = "execution";
pub const ANALYSIS: &str = "analysis";
pub const REPORTING: &str = "reporting";

pub const STAGE_NAMES: [&str; 5] = [RESEARCH, QUERY_GENERATION, EXECUTION, ANALYSIS, REPORTING];

/// Logs and renders a resume skip.
fn skipped(services: &Services, run_id: &str, phase: &str, reason: &str) {
    tracing::info!(target: "geoprobe.pipeline", stage = "pipeline.stage_skipped", run_id, name = phase, reason);
    emit(
        &services.renderer,
        RenderEvent::PhaseSkipped {
            run_id: run_id.to_string(),
            phase: phase.to_string(),
            reason: reason.to_string(),
        },
    );
}
