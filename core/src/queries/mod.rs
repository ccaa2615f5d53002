//! AI-generated query sets for both run flows.

mod parse;
mod prompts;

use tracing::{info, warn};

use crate::error::GeoError;
use crate::provider::Provider;
use crate::types::{BrandProfile, GeneratedQuery, QueryStrategy};

pub use parse::parse_ai_queries;
pub use prompts::strategy_prompt;

/// Strategies used by category leaderboards.
pub const LEADERBOARD_STRATEGIES: [QueryStrategy; 4] = [
    QueryStrategy::DirectRec,
    QueryStrategy::Vertical,
    QueryStrategy::Comparison,
    QueryStrategy::Scenario,
];

/// Generates up to `total` queries split evenly across `strategies`.
///
/// Strategy prompts run concurrently. A strategy whose call fails is logged
/// and skipped; producing no queries at all is an error.
pub async fn generate_queries(
    llm: &dyn Provider,
    profile: &BrandProfile,
    strategies: &[QueryStrategy],
    total: usize,
) -> Result<Vec<GeneratedQuery>, GeoError> {
    if strategies.is_empty() {
        return Err(GeoError::Config("no query strategies configured".into()));
    }
    let per_strategy = total.div_ceil(strategies.len());

    let replies = futures::future::join_all(strategies.iter().map(|&strategy| async move {
        let prompt = strategy_prompt(strategy, profile, per_strategy);
        (strategy, llm.query(&prompt).await)
    }))
    .await;

    let mut all = Vec::new();
    for (strategy, reply) in replies {
        match reply {
            Ok(resp) => {
                let parsed = parse_ai_queries(&resp.text, strategy, per_strategy);
                info!(target: "geoprobe.queries", stage = "queries.strategy", strategy = %strategy, count = parsed.len());
                all.extend(parsed);
            }
            Err(error) => {
                warn!(target: "geoprobe.queries", stage = "queries.strategy_failed", strategy = %strategy, %error);
            }
        }
    }
    all.truncate(total);

    if all.is_empty() {
        return Err(GeoError::pipeline(
            "query-generation",
            "query generation failed: no queries produced",
        ));
    }
    Ok(all)
}
