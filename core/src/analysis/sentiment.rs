use std::collections::BTreeMap;

use super::{round_to, usable};
use crate::types::{QueryResult, SentimentExcerpt, SentimentLabel, SentimentScore};
use crate::util::{contains_brand, split_sentences, truncate_chars};

const LEXICON: &[(&str, f64)] = &[
    ("best", 3.2),
    ("excellent", 3.2),
    ("outstanding", 3.1),
    ("great", 3.1),
    ("love", 3.2),
    ("leading", 2.2),
    ("leader", 2.0),
    ("powerful", 2.0),
    ("reliable", 1.9),
    ("trusted", 2.1),
    ("popular", 1.8),
    ("recommended", 1.5),
    ("recommend", 1.5),
    ("innovative", 1.9),
    ("intuitive", 1.8),
    ("easy", 1.9),
    ("strong", 2.3),
    ("robust", 1.9),
    ("good", 1.9),
    ("solid", 1.6),
    ("fast", 1.2),
    ("affordable", 1.6),
    ("secure", 1.4),
    ("flexible", 1.4),
    ("scalable", 1.3),
    ("comprehensive", 1.5),
    ("user-friendly", 2.0),
    ("favorite", 2.0),
    ("impressive", 2.3),
    ("seamless", 1.8),
    ("bad", -2.5),
    ("poor", -2.1),
    ("worst", -3.1),
    ("expensive", -1.5),
    ("costly", -1.5),
    ("complex", -1.0),
    ("complicated", -1.4),
    ("difficult", -1.5),
    ("limited", -1.2),
    ("lacks", -1.4),
    ("lacking", -1.5),
    ("outdated", -1.6),
    ("slow", -1.3),
    ("buggy", -2.0),
    ("clunky", -1.6),
    ("frustrating", -2.2),
    ("confusing", -1.8),
    ("unreliable", -2.0),
    ("weak", -1.9),
    ("steep", -0.8),
    ("drawback", -1.5),
    ("drawbacks", -1.5),
    ("issues", -1.2),
    ("problems", -1.7),
    ("concerns", -1.2),
    ("overpriced", -2.1),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "isn't", "isnt", "doesn't", "doesnt", "don't", "dont", "without", "hardly",
];

const BOOSTERS: &[&str] = &[
    "very", "extremely", "highly", "really", "incredibly", "especially", "most", "particularly",
];

const NEGATION_SCALAR: f64 = -0.74;
const BOOSTER_INCREMENT: f64 = 0.293;
const NORMALIZE_ALPHA: f64 = 15.0;
const TOP_EXCERPTS: usize = 5;
const EXCERPT_CHARS: usize = 200;

fn valence(word: &str) -> Option<f64> {
    LEXICON.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

/// Lexicon compound score of one sentence in [-1, 1].
pub fn score_sentence(sentence: &str) -> f64 {
    let tokens: Vec<String> = sentence
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    let mut sum = 0.0;
    for (i, tok) in tokens.iter().enumerate() {
        let Some(mut v) = valence(tok) else {
            continue;
        };
        if i > 0 && BOOSTERS.contains(&tokens[i - 1].as_str()) {
            v += BOOSTER_INCREMENT * v.signum();
        }
        let window = &tokens[i.saturating_sub(3)..i];
        if window.iter().any(|t| NEGATORS.contains(&t.as_str())) {
            v *= NEGATION_SCALAR;
        }
        sum += v;
    }

    if sum == 0.0 {
        return 0.0;
    }
    (sum / (sum * sum + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn sample_stdev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// Scores sentences that mention `brand`.
pub fn analyze_sentiment(results: &[QueryResult], brand: &str) -> SentimentScore {
    let mut scored: Vec<SentimentExcerpt> = Vec::new();
    for r in usable(results) {
        for sentence in split_sentences(&r.response) {
            if contains_brand(sentence, brand) {
                scored.push(SentimentExcerpt {
                    text: sentence.to_string(),
                    score: score_sentence(sentence),
                    provider: r.provider.clone(),
                });
            }
        }
    }
    if scored.is_empty() {
        return SentimentScore::default();
    }

    let scores: Vec<f64> = scored.iter().map(|s| s.score).collect();
    let overall = mean(&scores);
    let sample_factor = (scored.len() as f64 / 10.0).min(1.0);
    let variance_factor = (1.0 - sample_stdev(&scores)).max(0.0);

    let positive = scores.iter().filter(|s| **s >= 0.05).count();
    let negative = scores.iter().filter(|s| **s <= -0.05).count();

    let mut per_provider: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for s in &scored {
        per_provider.entry(s.provider.clone()).or_default().push(s.score);
    }

    let mut sorted = scored.clone();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    let excerpt = |s: &SentimentExcerpt| SentimentExcerpt {
        text: truncate_chars(&s.text, EXCERPT_CHARS).to_string(),
        score: round_to(s.score, 4),
        provider: s.provider.clone(),
    };
    let top_positive = sorted
        .iter()
        .filter(|s| s.score >= 0.05)
        .take(TOP_EXCERPTS)
        .map(excerpt)
        .collect();
    let top_negative = sorted
        .iter()
        .rev()
        .filter(|s| s.score <= -0.05)
        .take(TOP_EXCERPTS)
        .map(excerpt)
        .collect();

    SentimentScore {
        overall: round_to(overall, 4),
        label: SentimentLabel::from_score(overall),
        confidence: round_to(sample_factor * variance_factor, 2),
        by_provider: per_provider
            .into_iter()
            .map(|(p, xs)| (p, round_to(mean(&xs), 4)))
            .collect(),
        positive_count: positive,
        neutral_count: scores.len() - positive - negative,
        negative_count: negative,
        total_sentences: scores.len(),
        top_positive,
        top_negative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::result;

    #[test]
    fn sentence_polarity() {
        assert!(score_sentence("Acme is an excellent, reliable choice") > 0.5);
        assert!(score_sentence("Acme is expensive and buggy") < -0.3);
        assert!(score_sentence("Acme is not good") < 0.0);
        assert_eq!(score_sentence("Acme was founded in 2010"), 0.0);
        assert!(score_sentence("very good") > score_sentence("good"));
    }

    #[test]
    fn only_brand_sentences_count() {
        let results = vec![
            result("openai", "q1", "Acme is excellent. Beta is terrible and buggy."),
            result("anthropic", "q1", "Acme is expensive. Other tools exist."),
        ];
        let s = analyze_sentiment(&results, "Acme");
        assert_eq!(s.total_sentences, 2);
        assert_eq!(s.positive_count, 1);
        assert_eq!(s.negative_count, 1);
        assert_eq!(s.top_positive.len(), 1);
        assert_eq!(s.top_negative[0].provider, "anthropic");
        assert!(s.by_provider["openai"] > 0.0);
    }
}
