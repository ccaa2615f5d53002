use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::context::{RunContext, Services};
use crate::error::GeoError;
use crate::pipeline::PipelineStage;
use crate::storage::{layout, StorageExt};
use crate::types::BrandProfile;
use crate::util::parse_llm_json;

use super::{skipped, RESEARCH};

/// Substring every research prompt contains; lets tests script the reply.
pub const RESEARCH_PROMPT_MARKER: &str = "Research the brand";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResearchReply {
    description: String,
    industry: String,
    category: String,
    competitors: Vec<String>,
    keywords: Vec<String>,
    unique_selling_points: Vec<String>,
    target_audience: Vec<String>,
}

fn research_prompt(brand: &str, website: Option<&str>) -> String {
    let site = website
        .map(|w| format!(" (website: {w})"))
        .unwrap_or_default();
    format!(
        r#"{RESEARCH_PROMPT_MARKER} "{brand}"{site} and return a JSON object with these fields:
- "description": one paragraph describing what the brand does
- "industry": the broad industry
- "category": the specific product category people would search for
- "competitors": up to 8 direct competitor brand names
- "keywords": 5-10 search keywords for this category
- "unique_selling_points": what sets the brand apart
- "target_audience": the main customer segments

Return ONLY the JSON object."#
    )
}

/// Builds the brand profile with the processing provider and persists it as
/// `brand-profile.json`.
pub struct ResearchStage {
    services: Services,
}

impl ResearchStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl PipelineStage for ResearchStage {
    fn name(&self) -> &str {
        RESEARCH
    }

    fn description(&self) -> &str {
        "Research the brand profile"
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), GeoError> {
        if ctx.brand_profile.is_some() {
            skipped(&self.services, ctx.run_id(), RESEARCH, "brand profile already loaded");
            return Ok(());
        }

        let prompt = research_prompt(&ctx.brand, ctx.config.website.as_deref());
        let reply = self
            .services
            .processing
            .query(&prompt)
            .await
            .map_err(|e| GeoError::pipeline(RESEARCH, format!("brand research failed: {e}")))?;

        let parsed = match parse_llm_json::<ResearchReply>(&reply.text) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(target: "geoprobe.pipeline", stage = "research.parse_failed", run_id = ctx.run_id(), %error);
                ResearchReply::default()
            }
        };

        let competitors = if parsed.competitors.is_empty() {
            ctx.config.competitors.clone()
        } else {
            parsed.competitors
        };
        let profile = BrandProfile {
            name: ctx.brand.clone(),
            website: ctx.config.website.clone(),
            description: parsed.description,
            industry: parsed.industry,
            category: parsed.category,
            competitors,
            keywords: parsed.keywords,
            unique_selling_points: parsed.unique_selling_points,
            target_audience: parsed.target_audience,
        };

        self.services
            .storage
            .save(ctx.run_id(), layout::BRAND_PROFILE, &profile)
            .await?;
        info!(
            target: "geoprobe.pipeline",
            stage = "research.done",
            run_id = ctx.run_id(),
            category = %profile.category,
            competitors = profile.competitors.len()
        );
        ctx.brand_profile = Some(profile);
        Ok(())
    }
}
