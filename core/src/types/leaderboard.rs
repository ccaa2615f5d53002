use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::analysis::{AnalysisResult, BrandClaim, SentimentLabel};

const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub brand: String,
    pub overall_score: f64,
    pub mention_rate: f64,
    pub mindshare: f64,
    #[serde(default)]
    pub rank_position_score: f64,
    #[serde(default)]
    pub avg_rank_position: f64,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    #[serde(default)]
    pub mention_rate_by_provider: BTreeMap<String, f64>,
    #[serde(default)]
    pub total_mentions: usize,
    #[serde(default)]
    pub total_responses: usize,
    #[serde(default)]
    pub mindshare_rank: usize,
    #[serde(default)]
    pub total_brands_detected: usize,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub top_positive_excerpt: String,
    #[serde(default)]
    pub top_negative_excerpt: String,
}

impl LeaderboardEntry {
    /// Unranked entry built from a brand's analysis; `rank` is assigned later.
    pub fn from_analysis(brand: &str, analysis: &AnalysisResult) -> Self {
        let excerpt = |v: &[super::analysis::SentimentExcerpt]| {
            v.first()
                .map(|e| e.text.chars().take(EXCERPT_CHARS).collect())
                .unwrap_or_default()
        };
        Self {
            rank: 0,
            brand: brand.to_string(),
            overall_score: analysis.summary.overall_score,
            mention_rate: analysis.mention_rate.overall,
            mindshare: analysis.mindshare.overall,
            rank_position_score: analysis.rank_position.weighted_visibility,
            avg_rank_position: analysis.rank_position.avg_position,
            sentiment_score: analysis.sentiment.overall,
            sentiment_label: analysis.sentiment.label,
            mention_rate_by_provider: analysis.mention_rate.by_provider.clone(),
            total_mentions: analysis.mention_rate.total_mentions,
            total_responses: analysis.mention_rate.total_responses,
            mindshare_rank: analysis.mindshare.rank,
            total_brands_detected: analysis.mindshare.total_brands_detected,
            strengths: analysis.summary.strengths.clone(),
            weaknesses: analysis.summary.weaknesses.clone(),
            top_positive_excerpt: excerpt(&analysis.sentiment.top_positive),
            top_negative_excerpt: excerpt(&analysis.sentiment.top_negative),
        }
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResult {
    pub run_id: String,
    pub category: String,
    pub brands: Vec<String>,
    /// Sorted by rank. Empty when the run stopped before ranking.
    pub entries: Vec<LeaderboardEntry>,
    pub total_queries: usize,
    pub providers_used: Vec<String>,
    pub analyzed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_after: Option<String>,
}

/// Phase-4 output: everything per-brand analysis needs besides raw results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionCheckpoint {
    pub brands: Vec<String>,
    #[serde(default)]
    pub alias_map: BTreeMap<String, String>,
    #[serde(default)]
    pub extracted_claims: Vec<BrandClaim>,
    #[serde(default)]
    pub ranked_lists_by_response: BTreeMap<String, Vec<String>>,
    /// Brand to its analysis artifact path. Distinct brands whose slugs
    /// collide get numbered files.
    #[serde(default)]
    pub analysis_files: BTreeMap<String, String>,
}
