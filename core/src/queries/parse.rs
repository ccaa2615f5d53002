use std::sync::OnceLock;

use regex::Regex;

use crate::types::{GeneratedQuery, QueryCategory, QueryStrategy};

const MIN_QUERY_CHARS: usize = 10;

fn numbering() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+[.)]\s*|[-*•]\s*)+").ok())
        .as_ref()
}

fn new_query_id(strategy: QueryStrategy) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", strategy.id_prefix(), &hex[..8])
}

/// Parses `text | category | intent [| persona]` lines from a model reply.
///
/// Numbering and bullets are stripped; headings, fences, lines without a
/// pipe and query texts under ten characters are skipped.
pub fn parse_ai_queries(text: &str, strategy: QueryStrategy, max_count: usize) -> Vec<GeneratedQuery> {
    let mut out = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if out.len() >= max_count {
            break;
        }
        let cleaned = match numbering() {
            Some(re) => re.replace(line, "").trim().to_string(),
            None => line.to_string(),
        };
        if cleaned.is_empty() || cleaned.starts_with('#') || cleaned.starts_with("```") {
            continue;
        }

        let parts: Vec<&str> = cleaned.split('|').map(str::trim).collect();
        if parts.len() < 2 {
            continue;
        }
        let query_text = parts[0].trim_matches('"');
        if query_text.chars().count() < MIN_QUERY_CHARS {
            continue;
        }

        let intent = parts
            .get(2)
            .map(|s| s.to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "general".to_string());
        let persona = parts
            .get(3)
            .map(|s| s.to_lowercase())
            .filter(|s| !s.is_empty());

        out.push(GeneratedQuery {
            id: new_query_id(strategy),
            text: query_text.to_string(),
            category: QueryCategory::parse_lenient(parts[1]),
            strategy,
            intent,
            persona,
        });
    }
    out
}
