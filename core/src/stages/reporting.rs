use async_trait::async_trait;
use tracing::info;

use crate::config::ReportFormat;
use crate::context::{RunContext, Services};
use crate::error::GeoError;
use crate::pipeline::PipelineStage;
use crate::report::{render_run_markdown, RunReport};
use crate::storage::{layout, StorageExt};

use super::REPORTING;

/// Writes the configured report formats under `reports/`.
pub struct ReportingStage {
    services: Services,
}

impl ReportingStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl PipelineStage for ReportingStage {
    fn name(&self) -> &str {
        REPORTING
    }

    fn description(&self) -> &str {
        "Write reports"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), GeoError> {
        let report = RunReport::from_context(ctx);
        let storage = &self.services.storage;
        for format in &ctx.config.report.formats {
            let rel = match format {
                ReportFormat::Json => {
                    storage.save(ctx.run_id(), layout::REPORT_JSON, &report).await?;
                    layout::REPORT_JSON
                }
                ReportFormat::Markdown => {
                    storage
                        .save_text(ctx.run_id(), layout::REPORT_MD, &render_run_markdown(&report))
                        .await?;
                    layout::REPORT_MD
                }
            };
            info!(target: "geoprobe.pipeline", stage = "report.written", run_id = ctx.run_id(), path = rel);
        }
        Ok(())
    }
}
