use std::collections::BTreeMap;

use super::{round_to, usable};
use crate::types::{QueryResult, RankPositionScore};
use crate::util::normalize_name;

fn ranked_list_for<'a>(
    r: &QueryResult,
    ranked_lists: &'a BTreeMap<String, Vec<String>>,
) -> Option<&'a Vec<String>> {
    [
        r.response_key(),
        format!("{}:{}", r.provider, r.query_id),
        r.query_id.clone(),
    ]
    .iter()
    .find_map(|key| ranked_lists.get(key).filter(|list| !list.is_empty()))
}

/// Explicit-ranking placement of `brand`.
///
/// Weighted visibility is the sum of `1/position` over every response that
/// carried a ranked list, divided by the number of such responses; lists
/// without the brand contribute zero.
pub fn analyze_rank_position(
    results: &[QueryResult],
    brand: &str,
    ranked_lists: &BTreeMap<String, Vec<String>>,
) -> RankPositionScore {
    let target_lower = brand.to_lowercase();
    let target_norm = normalize_name(brand);

    let mut positions: Vec<usize> = Vec::new();
    let mut weighted_sum = 0.0;
    let mut total_ranked = 0usize;
    let mut per_provider: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for r in usable(results) {
        let Some(ranked) = ranked_list_for(r, ranked_lists) else {
            continue;
        };
        total_ranked += 1;
        let slot = per_provider.entry(r.provider.clone()).or_default();
        slot.0 += 1;

        let found = ranked
            .iter()
            .position(|name| name.to_lowercase() == target_lower || normalize_name(name) == target_norm);
        if let Some(idx) = found {
            let position = idx + 1;
            let contribution = 1.0 / position as f64;
            positions.push(position);
            weighted_sum += contribution;
            slot.1 += contribution;
        }
    }

    if total_ranked == 0 {
        return RankPositionScore::default();
    }

    let mentioned = positions.len();
    let avg = if mentioned > 0 {
        positions.iter().sum::<usize>() as f64 / mentioned as f64
    } else {
        0.0
    };
    let median = {
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        match sorted.len() {
            0 => 0.0,
            n if n % 2 == 1 => sorted[n / 2] as f64,
            n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
        }
    };
    let top3 = positions.iter().filter(|p| **p <= 3).count();

    RankPositionScore {
        total_ranked_responses: total_ranked,
        mention_in_ranked_lists: mentioned,
        mention_coverage: round_to(mentioned as f64 / total_ranked as f64, 4),
        avg_position: round_to(avg, 3),
        median_position: round_to(median, 3),
        top3_rate: if mentioned > 0 {
            round_to(top3 as f64 / mentioned as f64, 4)
        } else {
            0.0
        },
        weighted_visibility: round_to(weighted_sum / total_ranked as f64, 4),
        by_provider: per_provider
            .into_iter()
            .map(|(p, (n, w))| (p, round_to(w / n as f64, 4)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::result;

    fn lists(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn weighted_visibility_averages_over_ranked_responses() {
        let results = vec![
            result("openai", "q1", "1. Acme 2. Beta"),
            result("openai", "q2", "1. Beta 2. Gamma 3. Acme"),
            result("openai", "q3", "no list here"),
        ];
        let ranked = lists(&[
            ("openai:q1:1", &["Acme", "Beta"]),
            ("openai:q2:1", &["Beta", "Gamma", "Acme"]),
        ]);
        let s = analyze_rank_position(&results, "Acme", &ranked);
        assert_eq!(s.total_ranked_responses, 2);
        assert_eq!(s.mention_in_ranked_lists, 2);
        assert_eq!(s.weighted_visibility, 0.6667);
        assert_eq!(s.avg_position, 2.0);
        assert_eq!(s.median_position, 2.0);
        assert_eq!(s.top3_rate, 1.0);
    }

    #[test]
    fn absent_from_a_ranked_list_counts_as_zero() {
        let results = vec![
            result("openai", "q1", "x"),
            result("anthropic", "q1", "y"),
        ];
        let ranked = lists(&[("openai:q1:1", &["acme"]), ("anthropic:q1", &["Beta"])]);
        let s = analyze_rank_position(&results, "Acme", &ranked);
        assert_eq!(s.total_ranked_responses, 2);
        assert_eq!(s.weighted_visibility, 0.5);
        assert_eq!(s.mention_coverage, 0.5);
        assert_eq!(s.by_provider["anthropic"], 0.0);
        assert_eq!(s.by_provider["openai"], 1.0);
    }
}
