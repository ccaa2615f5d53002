use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::RegexSet;
use tracing::{info, warn};

use super::ask;
use super::dedup::Canonicalizer;
use crate::executor::run_bounded;
use crate::provider::Provider;
use crate::util::{parse_llm_json, truncate_chars};

const BATCH_SIZE: usize = 8;
const RESPONSE_CHARS: usize = 4_000;
const BATCH_CONCURRENCY: usize = 4;

fn ranking_patterns() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new([
            r"(?m)^\s*(?:\*\*)?\d{1,2}[.)]\s+\S",
            r"(?i)\btop\s+\d{1,2}\b",
            r"(?i)\btier\s*(?:\d|one|two|three|[a-c]\b)",
            r"(?i)\brank(?:ed|ing|ings|s)?\b",
            r"#1\b",
        ])
        .unwrap_or_else(|_| RegexSet::empty())
    })
}

/// Cheap pre-filter: does the text plausibly contain an explicit ranking?
pub fn looks_ranked(text: &str) -> bool {
    ranking_patterns().is_match(text)
}

fn batch_prompt(category: &str, brands: &[String], batch: &[(&String, &String)]) -> String {
    let body = batch
        .iter()
        .map(|(id, text)| format!("### RESPONSE {id}\n{}", truncate_chars(text, RESPONSE_CHARS)))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        r##"For each AI response below about "{category}", list the brands in the exact order the response explicitly ranks or numbers them.

Known brands: {known}

RULES:
- Only use an order the response states explicitly (numbered list, "top N", tiers, "#1"); otherwise return []
- Use the known brand names where they match
- Return ONLY a JSON object mapping each response id to an array of names

{body}

JSON object:"##,
        known = brands.join(", "),
    )
}

/// Ordered canonical brand lists keyed by response id.
///
/// `items` are `(response_key, response_text)`. Responses that fail the
/// heuristic are never sent; a failed batch is skipped. Names that do not
/// resolve to a canonical brand are dropped and duplicates removed.
pub async fn extract_ranked_lists(
    llm: &dyn Provider,
    items: &[(String, String)],
    category: &str,
    brands: &[String],
    alias_map: &BTreeMap<String, String>,
) -> BTreeMap<String, Vec<String>> {
    let plausible: Vec<(&String, &String)> = items
        .iter()
        .filter(|(_, text)| looks_ranked(text))
        .map(|(id, text)| (id, text))
        .collect();
    if plausible.is_empty() || brands.is_empty() {
        return BTreeMap::new();
    }

    let canon = Canonicalizer::new(brands, alias_map);
    let batches: Vec<&[(&String, &String)]> = plausible.chunks(BATCH_SIZE).collect();

    let replies = run_bounded(batches, BATCH_CONCURRENCY, |batch| async move {
        let prompt = batch_prompt(category, brands, batch);
        let parsed = ask(llm, &prompt)
            .await
            .map_err(|e| e.to_string())
            .and_then(|text| parse_llm_json::<BTreeMap<String, Vec<String>>>(&text));
        (batch, parsed)
    })
    .await
    .unwrap_or_default();

    let mut out = BTreeMap::new();
    for (batch, parsed) in replies {
        let lists = match parsed {
            Ok(lists) => lists,
            Err(error) => {
                warn!(target: "geoprobe.extract", stage = "extract.ranking_batch_failed", size = batch.len(), %error);
                continue;
            }
        };
        for (id, _) in batch {
            let Some(raw) = lists.get(id.as_str()) else {
                continue;
            };
            let mut ranked: Vec<String> = Vec::new();
            for name in raw {
                if let Some(c) = canon.resolve(name) {
                    if !ranked.iter().any(|r| r == c) {
                        ranked.push(c.to_string());
                    }
                }
            }
            out.insert(id.to_string(), ranked);
        }
    }

    info!(
        target: "geoprobe.extract",
        stage = "extract.ranking",
        candidates = plausible.len(),
        ranked = out.values().filter(|v| !v.is_empty()).count()
    );
    out
}
