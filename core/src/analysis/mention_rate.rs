use std::collections::BTreeMap;

use super::{round_to, usable};
use crate::types::{MentionRateScore, QueryResult};
use crate::util::contains_brand;

/// Share of usable responses that mention `brand` at least once.
pub fn analyze_mention_rate(results: &[QueryResult], brand: &str) -> MentionRateScore {
    let mut per_provider: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut mentions = 0;
    let mut total = 0;

    for r in usable(results) {
        let hit = contains_brand(&r.response, brand);
        total += 1;
        mentions += usize::from(hit);
        let slot = per_provider.entry(r.provider.clone()).or_default();
        slot.0 += usize::from(hit);
        slot.1 += 1;
    }

    if total == 0 {
        return MentionRateScore {
            total_responses: results.len(),
            ..Default::default()
        };
    }

    MentionRateScore {
        overall: round_to(mentions as f64 / total as f64, 4),
        by_provider: per_provider
            .into_iter()
            .map(|(p, (hit, n))| (p, round_to(hit as f64 / n as f64, 4)))
            .collect(),
        total_mentions: mentions,
        total_responses: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{failed, result};

    #[test]
    fn ignores_failed_results() {
        let results = vec![
            result("openai", "q1", "Acme leads."),
            result("openai", "q2", "Beta leads."),
            result("anthropic", "q1", "acme and beta"),
            failed("anthropic", "q2"),
        ];
        let s = analyze_mention_rate(&results, "Acme");
        assert_eq!(s.total_responses, 3);
        assert_eq!(s.total_mentions, 2);
        assert_eq!(s.overall, 0.6667);
        assert_eq!(s.by_provider["openai"], 0.5);
        assert_eq!(s.by_provider["anthropic"], 1.0);
    }
}
