/// Truncates to at most `max` chars without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Lowercase alphanumeric-only form, used for loose name equality.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Unicode case-insensitive equality.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn is_word_char(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric())
}

/// Case-insensitive whole-word occurrences of `brand` in `text`.
pub fn count_mentions(text: &str, brand: &str) -> usize {
    let needle = brand.trim().to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    let hay = text.to_lowercase();
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = hay[from..].find(&needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before = hay[..start].chars().next_back();
        let after = hay[end..].chars().next();
        if !is_word_char(before) && !is_word_char(after) {
            count += 1;
        }
        from = start + needle.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    count
}

pub fn contains_brand(text: &str, brand: &str) -> bool {
    count_mentions(text, brand) > 0
}

/// Splits on sentence punctuation followed by whitespace, and on newlines.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        let boundary = match ch {
            '\n' => Some(idx),
            '.' | '!' | '?' => match chars.peek() {
                Some((_, next)) if next.is_whitespace() => Some(idx + ch.len_utf8()),
                None => Some(idx + ch.len_utf8()),
                _ => None,
            },
            _ => None,
        };
        if let Some(end) = boundary {
            let s = text[start..end].trim();
            if !s.is_empty() {
                out.push(s);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_folding_covers_non_ascii_names() {
        assert!(eq_ignore_case("Société Générale", "SOCIÉTÉ GÉNÉRALE"));
        assert!(eq_ignore_case("acme", "ACME"));
        assert!(!eq_ignore_case("Acme", "Acme Inc"));
    }

    #[test]
    fn mentions_respect_word_boundaries() {
        let text = "Acme is great. acme beats Acmes. (ACME)";
        assert_eq!(count_mentions(text, "Acme"), 3);
        assert!(!contains_brand("Notion-like tools", "Ion"));
        assert!(contains_brand("Try monday.com today", "monday.com"));
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn sentences_split_on_punctuation_and_newlines() {
        let s = split_sentences("One. Two! v1.2 is out\n- Three?");
        assert_eq!(s, vec!["One.", "Two!", "v1.2 is out", "- Three?"]);
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_name("Monday.com"), "mondaycom");
        assert_eq!(normalize_name("HubSpot CRM"), "hubspotcrm");
    }
}
