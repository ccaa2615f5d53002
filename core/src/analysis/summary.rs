use super::round_to;
use crate::types::{AnalysisResult, ExecutiveSummary, SentimentLabel};

const W_MENTION_RATE: f64 = 28.0;
const W_MINDSHARE: f64 = 22.0;
const W_RANK: f64 = 25.0;
const W_SENTIMENT: f64 = 15.0;
const W_POSITIONING: f64 = 10.0;

const POSITIVE_ATTRIBUTES: &[&str] = &[
    "leader",
    "popular",
    "best",
    "top",
    "innovative",
    "reliable",
    "powerful",
    "simple",
    "enterprise",
    "scalable",
    "trusted",
    "fast",
    "secure",
    "flexible",
    "comprehensive",
    "user-friendly",
    "modern",
    "mature",
    "growing",
];
const NEGATIVE_ATTRIBUTES: &[&str] = &["expensive", "complex", "limited", "outdated", "basic"];

fn polarity(attribute: &str) -> f64 {
    if POSITIVE_ATTRIBUTES.contains(&attribute) {
        1.0
    } else if NEGATIVE_ATTRIBUTES.contains(&attribute) {
        -1.0
    } else {
        0.0
    }
}

/// Frequency-weighted polarity of the positioning attributes, each scaled by
/// its sentence sentiment and mapped onto [0, 1]. 0.5 when nothing was found.
pub fn positioning_strength(analysis: &AnalysisResult) -> f64 {
    let attrs = &analysis.positioning.attributes;
    let total: usize = attrs.iter().map(|a| a.frequency).sum();
    if total == 0 {
        return 0.5;
    }
    let weighted: f64 = attrs
        .iter()
        .map(|a| polarity(&a.attribute) * (a.sentiment + 1.0) / 2.0 * a.frequency as f64)
        .sum();
    let raw = (weighted / total as f64).clamp(-1.0, 1.0);
    (raw + 1.0) / 2.0
}

fn rank_visibility(analysis: &AnalysisResult) -> f64 {
    let rp = &analysis.rank_position;
    if rp.total_ranked_responses > 0 {
        rp.weighted_visibility
    } else if analysis.mindshare.rank > 0 {
        1.0 / analysis.mindshare.rank as f64
    } else {
        0.0
    }
}

fn overall_score(analysis: &AnalysisResult) -> f64 {
    let score = analysis.mention_rate.overall * W_MENTION_RATE
        + analysis.mindshare.overall * W_MINDSHARE
        + rank_visibility(analysis) * W_RANK
        + (analysis.sentiment.overall + 1.0) / 2.0 * W_SENTIMENT
        + positioning_strength(analysis) * W_POSITIONING;
    round_to(score, 1).clamp(0.0, 100.0)
}

pub fn build_summary(analysis: &AnalysisResult) -> ExecutiveSummary {
    let brand = &analysis.brand;
    let mr = analysis.mention_rate.overall;
    let ms = &analysis.mindshare;
    let sent = &analysis.sentiment;
    let rp = &analysis.rank_position;

    let mut findings = vec![
        format!("{brand} is mentioned in {:.1}% of AI responses", mr * 100.0),
        format!("Brand owns {:.1}% mindshare across AI models", ms.overall * 100.0),
        format!(
            "Overall sentiment is {} ({:.2}) with {:.0}% confidence",
            sent.label.as_str(),
            sent.overall,
            sent.confidence * 100.0
        ),
    ];
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut recommendations = Vec::new();

    let primary = &analysis.positioning.primary_position;
    if !primary.is_empty() && primary != "unknown" {
        findings.push(format!("AI models most often describe {brand} as '{primary}'"));
    }
    if let Some(leader) = analysis.competitor_analysis.competitors.first() {
        if leader.name != *brand {
            findings.push(format!("{} leads the competitive set on mindshare", leader.name));
        }
    }

    if rp.total_ranked_responses > 0 {
        findings.push(format!(
            "Appears in {}/{} explicit ranked lists",
            rp.mention_in_ranked_lists, rp.total_ranked_responses
        ));
        if rp.avg_position > 0.0 {
            findings.push(format!("Average explicit list position: #{:.1}", rp.avg_position));
        }
    }

    if mr > 0.5 {
        strengths.push("Strong presence across AI responses".to_string());
    } else if mr < 0.2 {
        weaknesses.push("Low mention rate: AI models rarely recommend this brand".to_string());
    }

    match sent.label {
        SentimentLabel::Positive => strengths.push("Positive sentiment when mentioned".to_string()),
        SentimentLabel::Negative => weaknesses.push("Negative sentiment in AI responses".to_string()),
        SentimentLabel::Neutral => {}
    }

    if ms.rank > 0 && ms.rank <= 3 {
        strengths.push(format!(
            "Ranked #{} out of {} brands for mindshare",
            ms.rank, ms.total_brands_detected
        ));
    } else if ms.rank > 3 {
        weaknesses.push(format!(
            "Ranked #{} out of {} brands for mindshare",
            ms.rank, ms.total_brands_detected
        ));
        recommendations
            .push("Focus on improving brand visibility in AI training data sources".to_string());
    }

    if rp.total_ranked_responses > 0 {
        if rp.top3_rate >= 0.5 {
            strengths.push("Frequently placed in top-3 in explicit ranking responses".to_string());
        } else if rp.mention_coverage < 0.25 {
            weaknesses.push("Rarely appears in explicit ranked lists".to_string());
            recommendations
                .push("Publish comparison-oriented content to improve list placement".to_string());
        }
    }

    if mr < 0.3 {
        recommendations
            .push("Create more authoritative content that AI models can reference".to_string());
    }
    if sent.label != SentimentLabel::Positive {
        recommendations
            .push("Address negative narratives and strengthen positive brand signals".to_string());
    }
    if analysis.narrative.brand_negative_count > analysis.narrative.brand_positive_count {
        weaknesses.push("More negative than positive claims in AI narratives".to_string());
    }

    let score = overall_score(analysis);
    let tier = if score > 60.0 {
        "Strong"
    } else if score > 30.0 {
        "Moderate"
    } else {
        "Weak"
    };

    ExecutiveSummary {
        headline: format!("{brand}: {tier} AI visibility ({score}/100)"),
        key_findings: findings,
        strengths,
        weaknesses,
        recommendations,
        overall_score: score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        MentionRateScore, MindshareScore, PositionAttribute, PositioningScore, RankPositionScore,
        SentimentScore,
    };

    fn attr(attribute: &str, frequency: usize, sentiment: f64) -> PositionAttribute {
        PositionAttribute {
            attribute: attribute.into(),
            frequency,
            sentiment,
        }
    }

    #[test]
    fn positioning_strength_weighs_attribute_polarity() {
        let mut a = AnalysisResult::default();
        assert_eq!(positioning_strength(&a), 0.5);

        a.positioning = PositioningScore {
            primary_position: "popular".into(),
            attributes: vec![attr("popular", 3, 0.5), attr("expensive", 1, 0.0)],
            ..Default::default()
        };
        // (0.75 * 3 - 0.5) / 4 = 0.4375
        assert!((positioning_strength(&a) - 0.71875).abs() < 1e-9);

        a.positioning.attributes = vec![attr("niche", 2, 0.9)];
        assert_eq!(positioning_strength(&a), 0.5);

        let s = build_summary(&a);
        assert!(s.key_findings.iter().any(|f| f.contains("as 'popular'")));
    }

    #[test]
    fn score_uses_weighted_visibility_when_ranked() {
        let a = AnalysisResult {
            brand: "Acme".into(),
            mention_rate: MentionRateScore {
                overall: 0.5,
                ..Default::default()
            },
            mindshare: MindshareScore {
                overall: 0.25,
                rank: 2,
                ..Default::default()
            },
            rank_position: RankPositionScore {
                total_ranked_responses: 2,
                weighted_visibility: 0.6667,
                ..Default::default()
            },
            sentiment: SentimentScore {
                overall: 0.2,
                ..Default::default()
            },
            ..Default::default()
        };
        // 14 + 5.5 + 16.6675 + 9 + 5
        let s = build_summary(&a);
        assert_eq!(s.overall_score, 50.2);
        assert!(s.headline.starts_with("Acme: Moderate"));
    }

    #[test]
    fn falls_back_to_inverse_mindshare_rank() {
        let a = AnalysisResult {
            mindshare: MindshareScore {
                rank: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        // 25/4 + 7.5 + 5
        assert_eq!(build_summary(&a).overall_score, 18.8);
    }
}
