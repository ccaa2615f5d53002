use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use super::ask;
use crate::provider::Provider;
use crate::util::{eq_ignore_case, normalize_name, parse_llm_json};

/// Canonical brand list plus the map from every raw name to its canonical.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupResult {
    pub brands: Vec<String>,
    pub alias_map: BTreeMap<String, String>,
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut cur = i;
    while parent[cur] != root {
        let next = parent[cur];
        parent[cur] = root;
        cur = next;
    }
    root
}

/// Layer 1: groups names where one is a case-insensitive substring of
/// another. The canonical is the longest member (first-seen on ties) and
/// groups keep the order of their first-seen member.
pub fn merge_substrings(names: &[String]) -> DedupResult {
    let lowered: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
    let mut parent: Vec<usize> = (0..names.len()).collect();

    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            let (a, b) = (&lowered[i], &lowered[j]);
            if a.is_empty() || b.is_empty() {
                continue;
            }
            if a.contains(b.as_str()) || b.contains(a.as_str()) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    let (lo, hi) = if ri < rj { (ri, rj) } else { (rj, ri) };
                    parent[hi] = lo;
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..names.len() {
        if lowered[i].is_empty() {
            continue;
        }
        let root = find(&mut parent, i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => groups.push((root, vec![i])),
        }
    }

    let mut result = DedupResult::default();
    for (_, members) in groups {
        let mut canonical = members[0];
        for &m in &members[1..] {
            if names[m].trim().chars().count() > names[canonical].trim().chars().count() {
                canonical = m;
            }
        }
        let canonical = names[canonical].trim().to_string();
        for &m in &members {
            result
                .alias_map
                .insert(names[m].trim().to_string(), canonical.clone());
        }
        result.brands.push(canonical);
    }
    result
}

/// Layer 2 merge step. A suggestion `(alias, canonical)` is accepted only
/// when both names are currently canonical and differ; rejected suggestions
/// are dropped silently. Returns the number of merges applied.
pub fn apply_alias_suggestions(
    result: &mut DedupResult,
    suggestions: &BTreeMap<String, String>,
) -> usize {
    let mut merged = 0;
    for (alias, target) in suggestions {
        let alias_idx = result
            .brands
            .iter()
            .position(|b| eq_ignore_case(b, alias.trim()));
        let target_idx = result
            .brands
            .iter()
            .position(|b| eq_ignore_case(b, target.trim()));
        let (Some(ai), Some(ti)) = (alias_idx, target_idx) else {
            debug!(target: "geoprobe.extract", stage = "extract.alias_rejected", alias = %alias, canonical = %target);
            continue;
        };
        if ai == ti {
            continue;
        }

        let alias_name = result.brands.remove(ai);
        let target_name = result.brands[if ti > ai { ti - 1 } else { ti }].clone();
        for canonical in result.alias_map.values_mut() {
            if *canonical == alias_name {
                *canonical = target_name.clone();
            }
        }
        result
            .alias_map
            .insert(alias_name, target_name);
        merged += 1;
    }
    merged
}

/// Full two-layer dedup. The LLM layer only runs with two or more
/// canonicals; if it fails, the lexical result stands.
pub async fn deduplicate_brands(llm: &dyn Provider, names: &[String], category: &str) -> DedupResult {
    let mut result = merge_substrings(names);
    if result.brands.len() < 2 {
        return result;
    }

    let listing = result
        .brands
        .iter()
        .map(|b| format!("- {b}"))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        r#"The following names were extracted as "{category}" brands. Some may refer to the same company under different names with no shared words (abbreviations, former names, parent/product names).

{listing}

Return ONLY a JSON object mapping each alias to the name it duplicates, using names exactly as listed. Return {{}} if there are no duplicates.

JSON object:"#
    );

    let suggestions = match ask(llm, &prompt)
        .await
        .map_err(|e| e.to_string())
        .and_then(|text| parse_llm_json::<BTreeMap<String, String>>(&text))
    {
        Ok(s) => s,
        Err(error) => {
            warn!(target: "geoprobe.extract", stage = "extract.dedup_llm_failed", %error);
            return result;
        }
    };

    let before = result.brands.len();
    let merged = apply_alias_suggestions(&mut result, &suggestions);
    info!(
        target: "geoprobe.extract",
        stage = "extract.dedup",
        raw = names.len(),
        before,
        after = result.brands.len(),
        merged
    );
    result
}

/// Maps free-form names back onto canonical brands via the alias map,
/// matching case-insensitively and then by alphanumeric-normalised form.
pub struct Canonicalizer {
    exact: HashMap<String, String>,
    normalized: HashMap<String, String>,
}

impl Canonicalizer {
    pub fn new(brands: &[String], alias_map: &BTreeMap<String, String>) -> Self {
        let mut exact = HashMap::new();
        let mut normalized = HashMap::new();
        let pairs = alias_map
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(brands.iter().map(|b| (b.as_str(), b.as_str())));
        for (raw, canonical) in pairs {
            if !brands.iter().any(|b| b == canonical) {
                continue;
            }
            exact.entry(raw.to_lowercase()).or_insert_with(|| canonical.to_string());
            let norm = normalize_name(raw);
            if !norm.is_empty() {
                normalized.entry(norm).or_insert_with(|| canonical.to_string());
            }
        }
        Self { exact, normalized }
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.exact
            .get(&name.trim().to_lowercase())
            .or_else(|| self.normalized.get(&normalize_name(name)))
            .map(String::as_str)
    }
}
