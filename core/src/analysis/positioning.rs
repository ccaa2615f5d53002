use std::collections::BTreeMap;

use super::{round_to, score_sentence, usable};
use crate::types::{PositionAttribute, PositioningScore, QueryResult};
use crate::util::{contains_brand, split_sentences};

const POSITION_KEYWORDS: &[&str] = &[
    "leader",
    "popular",
    "best",
    "top",
    "innovative",
    "affordable",
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
    "niche",
    "expensive",
    "complex",
    "limited",
    "outdated",
    "basic",
];

const MAX_ATTRIBUTES: usize = 10;

/// Keyword tally that remembers first-seen order for tie breaks.
#[derive(Default)]
struct Tally {
    entries: Vec<(&'static str, usize, Vec<f64>)>,
}

impl Tally {
    fn add(&mut self, keyword: &'static str, score: f64) {
        match self.entries.iter_mut().find(|(k, _, _)| *k == keyword) {
            Some((_, n, scores)) => {
                *n += 1;
                scores.push(score);
            }
            None => self.entries.push((keyword, 1, vec![score])),
        }
    }

    /// Most frequent first; equal counts keep first-seen order.
    fn ranked(&self) -> Vec<&(&'static str, usize, Vec<f64>)> {
        let mut out: Vec<_> = self.entries.iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }
}

/// Descriptor keywords found in sentences that mention `brand`, each with
/// the mean score of those sentences.
pub fn analyze_positioning(results: &[QueryResult], brand: &str) -> PositioningScore {
    let mut overall = Tally::default();
    let mut by_provider = BTreeMap::new();

    for r in usable(results) {
        let mut local = Tally::default();
        for sentence in split_sentences(&r.response) {
            if !contains_brand(sentence, brand) {
                continue;
            }
            let lower = sentence.to_lowercase();
            let score = score_sentence(sentence);
            for &kw in POSITION_KEYWORDS {
                if lower.contains(kw) {
                    overall.add(kw, score);
                    local.add(kw, score);
                }
            }
        }
        if let Some((top, _, _)) = local.ranked().first() {
            by_provider
                .entry(r.provider.clone())
                .or_insert_with(|| top.to_string());
        }
    }

    let ranked = overall.ranked();
    let attributes = ranked
        .iter()
        .take(MAX_ATTRIBUTES)
        .map(|(kw, n, scores)| PositionAttribute {
            attribute: kw.to_string(),
            frequency: *n,
            sentiment: round_to(scores.iter().sum::<f64>() / scores.len() as f64, 3),
        })
        .collect();

    PositioningScore {
        primary_position: ranked
            .first()
            .map(|(kw, _, _)| kw.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        attributes,
        by_provider,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{failed, result};

    #[test]
    fn counts_keywords_in_brand_sentences_only() {
        let results = vec![
            result("openai", "q1", "Acme is the popular leader. Beta is expensive."),
            result("openai", "q2", "Acme is popular with teams."),
            result("claude", "q1", "Acme is reliable. Acme is a popular pick."),
            failed("claude", "q2"),
        ];
        let p = analyze_positioning(&results, "Acme");

        assert_eq!(p.primary_position, "popular");
        let attrs: Vec<(&str, usize)> = p
            .attributes
            .iter()
            .map(|a| (a.attribute.as_str(), a.frequency))
            .collect();
        assert_eq!(attrs, vec![("popular", 3), ("leader", 1), ("reliable", 1)]);
        assert!(p.attributes.iter().all(|a| a.attribute != "expensive"));
        assert_eq!(p.by_provider["openai"], "leader");
        assert_eq!(p.by_provider["claude"], "reliable");
    }

    #[test]
    fn no_keywords_is_unknown() {
        let results = vec![result("openai", "q1", "Acme exists.")];
        let p = analyze_positioning(&results, "Acme");
        assert_eq!(p.primary_position, "unknown");
        assert!(p.attributes.is_empty());
        assert!(p.by_provider.is_empty());
    }
}
