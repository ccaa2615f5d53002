use super::{round_to, score_sentence, usable};
use crate::types::{CompetitorAnalysis, CompetitorScore, QueryResult};
use crate::util::{contains_brand, count_mentions, eq_ignore_case, split_sentences};

/// Mention rate, sentiment and mindshare for `brand` and each competitor,
/// sorted by mindshare descending.
pub fn analyze_competitors(results: &[QueryResult], brand: &str, competitors: &[String]) -> CompetitorAnalysis {
    let valid: Vec<&QueryResult> = usable(results).collect();
    if valid.is_empty() {
        return CompetitorAnalysis::default();
    }

    let mut all: Vec<&str> = vec![brand];
    for c in competitors {
        if !all.iter().any(|b| eq_ignore_case(b, c)) {
            all.push(c.as_str());
        }
    }

    let counts: Vec<usize> = all
        .iter()
        .map(|b| valid.iter().map(|r| count_mentions(&r.response, b)).sum::<usize>())
        .collect();
    let total_mentions: usize = counts.iter().sum();

    let mut scores: Vec<CompetitorScore> = all
        .iter()
        .zip(&counts)
        .map(|(name, &count)| {
            let hits = valid.iter().filter(|r| contains_brand(&r.response, name)).count();
            let sentiments: Vec<f64> = valid
                .iter()
                .flat_map(|r| split_sentences(&r.response))
                .filter(|s| contains_brand(s, name))
                .map(score_sentence)
                .collect();
            let sentiment = if sentiments.is_empty() {
                0.0
            } else {
                sentiments.iter().sum::<f64>() / sentiments.len() as f64
            };
            let mindshare = if total_mentions == 0 {
                0.0
            } else {
                count as f64 / total_mentions as f64
            };
            CompetitorScore {
                name: name.to_string(),
                mention_rate: round_to(hits as f64 / valid.len() as f64, 4),
                sentiment: round_to(sentiment, 4),
                mindshare: round_to(mindshare, 4),
            }
        })
        .collect();

    scores.sort_by(|a, b| b.mindshare.total_cmp(&a.mindshare));
    let brand_rank = scores
        .iter()
        .position(|c| c.name == brand)
        .map(|p| p + 1)
        .unwrap_or(0);

    CompetitorAnalysis {
        competitors: scores,
        brand_rank,
    }
}
