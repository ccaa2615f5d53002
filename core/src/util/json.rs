//! Tolerant JSON extraction from LLM replies.

use serde::de::DeserializeOwned;

/// Removes a surrounding ```json fence if present.
fn strip_fences(raw: &str) -> &str {
    let t = raw.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn slice_between(s: &str, open: char, close: char) -> Option<&str> {
    let start = s.find(open)?;
    let end = s.rfind(close)?;
    (end > start).then(|| &s[start..=end])
}

/// Parses `T` from an LLM reply: fenced or bare JSON, or the outermost
/// object/array embedded in prose.
pub fn parse_llm_json<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let body = strip_fences(raw);
    let first_err = match serde_json::from_str::<T>(body) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(slice) = slice_between(body, open, close) {
            if let Ok(v) = serde_json::from_str::<T>(slice) {
                return Ok(v);
            }
        }
    }
    Err(format!("no parseable JSON in model output: {first_err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn parses_fenced_and_embedded_json() {
        let v: Vec<String> = parse_llm_json("```json\n[\"Acme\", \"Beta\"]\n```").unwrap();
        assert_eq!(v, vec!["Acme", "Beta"]);

        let m: BTreeMap<String, String> =
            parse_llm_json("Sure! Here you go: {\"AC\": \"Acme\"} hope it helps").unwrap();
        assert_eq!(m.get("AC").map(String::as_str), Some("Acme"));
    }

    #[test]
    fn rejects_prose() {
        assert!(parse_llm_json::<Vec<String>>("I could not find any brands.").is_err());
    }
}
