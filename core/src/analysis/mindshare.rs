use std::collections::BTreeMap;

use super::{round_to, usable};
use crate::types::{MindshareScore, QueryResult};
use crate::util::{count_mentions, eq_ignore_case};

/// Fraction of all tracked-brand mentions that belong to `brand`.
pub fn analyze_mindshare(results: &[QueryResult], brand: &str, competitors: &[String]) -> MindshareScore {
    let mut all: Vec<&str> = vec![brand];
    for c in competitors {
        if !all.iter().any(|b| eq_ignore_case(b, c)) {
            all.push(c.as_str());
        }
    }

    let mut counts = vec![0usize; all.len()];
    let mut per_provider: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut any = false;

    for r in usable(results) {
        any = true;
        let slot = per_provider.entry(r.provider.clone()).or_default();
        for (idx, b) in all.iter().enumerate() {
            let n = count_mentions(&r.response, b);
            counts[idx] += n;
            slot.1 += n;
            if idx == 0 {
                slot.0 += n;
            }
        }
    }
    if !any {
        return MindshareScore::default();
    }

    let total: usize = counts.iter().sum();
    let ours = counts[0];

    // stable sort keeps discovery order among equal counts
    let mut order: Vec<usize> = (0..all.len()).collect();
    order.sort_by(|a, b| counts[*b].cmp(&counts[*a]));
    let rank = order.iter().position(|&i| i == 0).map(|p| p + 1).unwrap_or(0);

    let share = |ours: usize, total: usize| {
        if total == 0 {
            0.0
        } else {
            round_to(ours as f64 / total as f64, 4)
        }
    };

    MindshareScore {
        overall: share(ours, total),
        by_provider: per_provider
            .into_iter()
            .map(|(p, (o, t))| (p, share(o, t)))
            .collect(),
        rank,
        total_brands_detected: counts.iter().filter(|c| **c > 0).count(),
    }
}
