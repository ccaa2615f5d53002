use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use super::{round_to, usable};
use crate::types::{CitationScore, CitationSource, QueryResult};

const TOP_SOURCES: usize = 10;

fn url_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"')\]]+"#).ok())
        .as_ref()
}

fn domain_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, r)| r)?;
    let host = rest.split(['/', '?', '#']).next()?;
    (!host.is_empty()).then_some(host)
}

/// URLs and cited domains across usable responses.
pub fn analyze_citations(results: &[QueryResult]) -> CitationScore {
    let Some(re) = url_pattern() else {
        return CitationScore::default();
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    let mut providers: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut by_provider: BTreeMap<String, usize> = BTreeMap::new();
    let mut with_citations = 0usize;
    let mut total_responses = 0usize;

    for r in usable(results) {
        total_responses += 1;
        let entry = by_provider.entry(r.provider.clone()).or_default();
        let mut any = false;
        for m in re.find_iter(&r.response) {
            any = true;
            let Some(domain) = domain_of(m.as_str()) else {
                continue;
            };
            let domain = domain.to_lowercase();
            if !counts.contains_key(&domain) {
                first_seen.push(domain.clone());
            }
            *counts.entry(domain.clone()).or_default() += 1;
            providers.entry(domain).or_default().insert(r.provider.clone());
        }
        if any {
            with_citations += 1;
            *entry += 1;
        }
    }

    if total_responses == 0 {
        return CitationScore::default();
    }

    let mut ranked = first_seen;
    ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));
    let top_sources = ranked
        .iter()
        .take(TOP_SOURCES)
        .map(|d| CitationSource {
            source: d.clone(),
            count: counts[d],
            providers: providers
                .get(d)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default(),
        })
        .collect();

    CitationScore {
        total_citations: counts.values().sum(),
        unique_sources_cited: counts.len(),
        citation_rate: round_to(with_citations as f64 / total_responses as f64 * 100.0, 1),
        by_provider,
        top_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::result;

    #[test]
    fn counts_domains_and_rate() {
        let results = vec![
            result("perplexity", "q1", "See https://g2.com/acme and (https://acme.io/pricing)."),
            result("perplexity", "q2", "Source: https://G2.com/compare"),
            result("openai", "q1", "No links."),
        ];
        let c = analyze_citations(&results);
        assert_eq!(c.total_citations, 3);
        assert_eq!(c.unique_sources_cited, 2);
        assert_eq!(c.citation_rate, 66.7);
        assert_eq!(c.top_sources[0].source, "g2.com");
        assert_eq!(c.top_sources[0].count, 2);
        assert_eq!(c.by_provider["perplexity"], 2);
        assert_eq!(c.by_provider["openai"], 0);
    }
}
