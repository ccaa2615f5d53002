use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use crate::analysis::{analyze_brand, AnalyzerInputs, AnalyzerKind};
use crate::context::{RunContext, Services};
use crate::error::GeoError;
use crate::extract::{extract_claims, extract_competitors, extract_ranked_lists};
use crate::pipeline::PipelineStage;
use crate::storage::{layout, StorageExt};
use crate::types::{AnalysisSnapshot, BrandProfile};
use crate::util::eq_ignore_case;

use super::ANALYSIS;

const MAX_COMPETITORS: usize = 20;

/// Configured competitors first, then extracted ones; case-insensitive
/// duplicates and the brand itself are dropped.
fn merge_competitors(brand: &str, known: Vec<String>, extracted: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in known.into_iter().chain(extracted) {
        let name = name.trim();
        if name.is_empty()
            || eq_ignore_case(name, brand)
            || out.iter().any(|c| eq_ignore_case(c, name))
        {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

/// Runs the LLM extraction helpers and the configured analyzers, then
/// persists `analysis/analysis.json` and `analysis/snapshot.json`.
pub struct AnalysisStage {
    services: Services,
}

impl AnalysisStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl PipelineStage for AnalysisStage {
    fn name(&self) -> &str {
        ANALYSIS
    }

    fn description(&self) -> &str {
        "Analyze brand visibility"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), GeoError> {
        let Some(run) = ctx.execution_run.as_ref() else {
            return Err(GeoError::pipeline(ANALYSIS, "no execution results to analyze"));
        };
        let usable: Vec<_> = run.usable_results().collect();
        if usable.is_empty() {
            return Err(GeoError::pipeline(
                ANALYSIS,
                "No valid responses received from any provider",
            ));
        }

        let mut profile = ctx.brand_profile.clone().unwrap_or_else(|| BrandProfile {
            name: ctx.brand.clone(),
            ..Default::default()
        });
        let category = if profile.category.is_empty() {
            ctx.brand.clone()
        } else {
            profile.category.clone()
        };
        let kinds = ctx.config.analysis.analyzers.clone();
        let llm = self.services.processing.as_ref();
        let responses: Vec<&str> = usable.iter().map(|r| r.response.as_str()).collect();

        let extracted = if kinds.contains(&AnalyzerKind::Mindshare)
            || kinds.contains(&AnalyzerKind::Competitor)
        {
            extract_competitors(llm, &responses, &ctx.brand, &category, MAX_COMPETITORS).await
        } else {
            Vec::new()
        };
        let competitors = merge_competitors(&ctx.brand, ctx.competitors(), extracted);

        let ranked_lists = if kinds.contains(&AnalyzerKind::RankPosition) {
            let items: Vec<(String, String)> = usable
                .iter()
                .map(|r| (r.response_key(), r.response.clone()))
                .collect();
            let mut known = vec![ctx.brand.clone()];
            known.extend(competitors.iter().cloned());
            extract_ranked_lists(llm, &items, &category, &known, &BTreeMap::new()).await
        } else {
            BTreeMap::new()
        };

        let claims = if kinds.contains(&AnalyzerKind::Narrative) {
            extract_claims(llm, &responses, &ctx.brand, &category, None).await
        } else {
            Vec::new()
        };

        profile.competitors = competitors;
        let analysis = analyze_brand(
            ctx.run_id(),
            AnalyzerInputs {
                results: &run.results,
                profile: &profile,
                competitors: &profile.competitors,
                ranked_lists: &ranked_lists,
                claims: &claims,
            },
            &kinds,
        );

        let storage = &self.services.storage;
        storage.save(ctx.run_id(), layout::ANALYSIS, &analysis).await?;
        storage
            .save(ctx.run_id(), layout::SNAPSHOT, &AnalysisSnapshot::from(&analysis))
            .await?;
        info!(
            target: "geoprobe.pipeline",
            stage = "analysis.done",
            run_id = ctx.run_id(),
            overall_score = analysis.summary.overall_score,
            ranked_responses = ranked_lists.len(),
            claims = claims.len()
        );
        ctx.analysis_result = Some(analysis);
        Ok(())
    }
}
