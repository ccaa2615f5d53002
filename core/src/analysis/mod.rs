//! Per-brand analyzers over a shared result set.
//!
//! All analyzers are pure and synchronous so callers can move them onto the
//! blocking pool.

mod citation;
mod competitor;
mod mention_rate;
mod mindshare;
mod narrative;
mod positioning;
mod rank_position;
mod sentiment;
mod summary;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{AnalysisResult, BrandClaim, BrandProfile, QueryResult};

pub use citation::analyze_citations;
pub use competitor::analyze_competitors;
pub use mention_rate::analyze_mention_rate;
pub use mindshare::analyze_mindshare;
pub use narrative::analyze_narrative;
pub use positioning::analyze_positioning;
pub use rank_position::analyze_rank_position;
pub use sentiment::{analyze_sentiment, score_sentence};
pub use summary::{build_summary, positioning_strength};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerKind {
    Mindshare,
    MentionRate,
    Sentiment,
    Positioning,
    RankPosition,
    Citation,
    Competitor,
    Narrative,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 8] = [
        Self::Mindshare,
        Self::MentionRate,
        Self::Sentiment,
        Self::Positioning,
        Self::RankPosition,
        Self::Citation,
        Self::Competitor,
        Self::Narrative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mindshare => "mindshare",
            Self::MentionRate => "mention-rate",
            Self::Sentiment => "sentiment",
            Self::Positioning => "positioning",
            Self::RankPosition => "rank-position",
            Self::Citation => "citation",
            Self::Competitor => "competitor",
            Self::Narrative => "narrative",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyzerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| format!("unknown analyzer '{s}'"))
    }
}

/// Everything an analyzer may read. Borrowed so one result set can feed
/// many brands.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerInputs<'a> {
    pub results: &'a [QueryResult],
    pub profile: &'a BrandProfile,
    /// Other brands competing for mindshare with `profile.name`.
    pub competitors: &'a [String],
    pub ranked_lists: &'a BTreeMap<String, Vec<String>>,
    pub claims: &'a [BrandClaim],
}

/// Runs `kinds` against `inputs` and derives the executive summary.
pub fn analyze_brand(run_id: &str, inputs: AnalyzerInputs<'_>, kinds: &[AnalyzerKind]) -> AnalysisResult {
    let mut analysis = AnalysisResult {
        run_id: run_id.to_string(),
        brand: inputs.profile.name.clone(),
        analyzed_at: chrono::Utc::now().to_rfc3339(),
        ..Default::default()
    };

    for kind in kinds {
        match kind {
            AnalyzerKind::Mindshare => {
                analysis.mindshare =
                    analyze_mindshare(inputs.results, &inputs.profile.name, inputs.competitors)
            }
            AnalyzerKind::MentionRate => {
                analysis.mention_rate = analyze_mention_rate(inputs.results, &inputs.profile.name)
            }
            AnalyzerKind::Sentiment => {
                analysis.sentiment = analyze_sentiment(inputs.results, &inputs.profile.name)
            }
            AnalyzerKind::Positioning => {
                analysis.positioning = analyze_positioning(inputs.results, &inputs.profile.name)
            }
            AnalyzerKind::RankPosition => {
                analysis.rank_position =
                    analyze_rank_position(inputs.results, &inputs.profile.name, inputs.ranked_lists)
            }
            AnalyzerKind::Citation => analysis.citations = analyze_citations(inputs.results),
            AnalyzerKind::Competitor => {
                analysis.competitor_analysis =
                    analyze_competitors(inputs.results, &inputs.profile.name, inputs.competitors)
            }
            AnalyzerKind::Narrative => {
                analysis.narrative = analyze_narrative(inputs.claims, &inputs.profile.name)
            }
        }
    }

    analysis.summary = build_summary(&analysis);
    analysis
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub(crate) fn usable(results: &[QueryResult]) -> impl Iterator<Item = &QueryResult> {
    results.iter().filter(|r| r.is_usable())
}
