use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.05 {
            Self::Positive
        } else if score <= -0.05 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentExcerpt {
    pub text: String,
    pub score: f64,
    pub provider: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentScore {
    pub overall: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
    pub by_provider: BTreeMap<String, f64>,
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
    pub total_sentences: usize,
    pub top_positive: Vec<SentimentExcerpt>,
    pub top_negative: Vec<SentimentExcerpt>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindshareScore {
    pub overall: f64,
    pub by_provider: BTreeMap<String, f64>,
    pub rank: usize,
    pub total_brands_detected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionRateScore {
    pub overall: f64,
    pub by_provider: BTreeMap<String, f64>,
    pub total_mentions: usize,
    pub total_responses: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankPositionScore {
    pub total_ranked_responses: usize,
    pub mention_in_ranked_lists: usize,
    pub mention_coverage: f64,
    pub avg_position: f64,
    pub median_position: f64,
    pub top3_rate: f64,
    pub weighted_visibility: f64,
    pub by_provider: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAttribute {
    pub attribute: String,
    pub frequency: usize,
    /// Mean sentence score where the attribute appeared.
    pub sentiment: f64,
}

/// How responses describe the brand: descriptor keywords in sentences that
/// mention it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositioningScore {
    pub primary_position: String,
    /// At most ten, most frequent first.
    pub attributes: Vec<PositionAttribute>,
    /// Provider to its most frequent attribute.
    pub by_provider: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorScore {
    pub name: String,
    pub mention_rate: f64,
    pub sentiment: f64,
    pub mindshare: f64,
}

/// The brand and its competitors side by side, sorted by mindshare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorAnalysis {
    pub competitors: Vec<CompetitorScore>,
    /// 1-based position of the brand in `competitors`; 0 when absent.
    pub brand_rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationSource {
    pub source: String,
    pub count: usize,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationScore {
    pub total_citations: usize,
    pub unique_sources_cited: usize,
    pub citation_rate: f64,
    pub by_provider: BTreeMap<String, usize>,
    pub top_sources: Vec<CitationSource>,
}

/// One attribute-level statement an LLM extracted from a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandClaim {
    pub brand: String,
    #[serde(default)]
    pub attribute: String,
    #[serde(default)]
    pub sentiment: SentimentLabel,
    #[serde(default)]
    pub claim: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeAnalysis {
    pub claims: Vec<BrandClaim>,
    pub total_claims: usize,
    pub brand_themes: BTreeMap<String, usize>,
    pub brand_positive_count: usize,
    pub brand_negative_count: usize,
    pub brand_neutral_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutiveSummary {
    pub headline: String,
    pub key_findings: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub run_id: String,
    pub brand: String,
    #[serde(default)]
    pub analyzed_at: String,
    #[serde(default)]
    pub mindshare: MindshareScore,
    #[serde(default)]
    pub mention_rate: MentionRateScore,
    #[serde(default)]
    pub sentiment: SentimentScore,
    #[serde(default)]
    pub positioning: PositioningScore,
    #[serde(default)]
    pub rank_position: RankPositionScore,
    #[serde(default)]
    pub citations: CitationScore,
    #[serde(default)]
    pub competitor_analysis: CompetitorAnalysis,
    #[serde(default)]
    pub narrative: NarrativeAnalysis,
    #[serde(default)]
    pub summary: ExecutiveSummary,
}

/// Slim view of an analysis written next to the full result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub run_id: String,
    pub brand: String,
    pub analyzed_at: String,
    pub overall_score: f64,
    pub mention_rate: f64,
    pub mindshare: f64,
    pub weighted_visibility: f64,
    pub sentiment: f64,
    pub sentiment_label: SentimentLabel,
    #[serde(default)]
    pub primary_position: String,
    #[serde(default)]
    pub competitor_rank: usize,
    #[serde(default)]
    pub leader_brand: String,
}

impl From<&AnalysisResult> for AnalysisSnapshot {
    fn from(a: &AnalysisResult) -> Self {
        Self {
            run_id: a.run_id.clone(),
            brand: a.brand.clone(),
            analyzed_at: a.analyzed_at.clone(),
            overall_score: a.summary.overall_score,
            mention_rate: a.mention_rate.overall,
            mindshare: a.mindshare.overall,
            weighted_visibility: a.rank_position.weighted_visibility,
            sentiment: a.sentiment.overall,
            sentiment_label: a.sentiment.label,
            primary_position: a.positioning.primary_position.clone(),
            competitor_rank: if a.competitor_analysis.brand_rank > 0 {
                a.competitor_analysis.brand_rank
            } else {
                a.mindshare.rank
            },
            leader_brand: a
                .competitor_analysis
                .competitors
                .first()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        }
    }
}
