use std::collections::BTreeMap;

use crate::types::{BrandClaim, NarrativeAnalysis, SentimentLabel};

/// Themes and claim polarity for `brand` among extracted claims.
pub fn analyze_narrative(claims: &[BrandClaim], brand: &str) -> NarrativeAnalysis {
    if claims.is_empty() {
        return NarrativeAnalysis::default();
    }
    let brand_lower = brand.to_lowercase();
    let own: Vec<BrandClaim> = claims
        .iter()
        .filter(|c| c.brand.to_lowercase() == brand_lower)
        .cloned()
        .collect();

    let mut themes: BTreeMap<String, usize> = BTreeMap::new();
    for c in &own {
        let key = if c.attribute.is_empty() {
            "general".to_string()
        } else {
            c.attribute.clone()
        };
        *themes.entry(key).or_default() += 1;
    }
    let count = |label: SentimentLabel| own.iter().filter(|c| c.sentiment == label).count();

    NarrativeAnalysis {
        total_claims: claims.len(),
        brand_positive_count: count(SentimentLabel::Positive),
        brand_negative_count: count(SentimentLabel::Negative),
        brand_neutral_count: count(SentimentLabel::Neutral),
        brand_themes: themes,
        claims: own,
    }
}
