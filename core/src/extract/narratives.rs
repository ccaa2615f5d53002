use serde::Deserialize;
use tracing::{info, warn};

use super::ask;
use super::brands::chunk_responses;
use super::dedup::Canonicalizer;
use crate::provider::Provider;
use crate::types::{BrandClaim, SentimentLabel};
use crate::util::parse_llm_json;

const CLAIM_CHUNK_CHARS: usize = 12_000;
const MAX_CLAIMS: usize = 300;

#[derive(Debug, Deserialize)]
struct RawClaim {
    #[serde(default)]
    brand: String,
    #[serde(default)]
    attribute: String,
    #[serde(default)]
    sentiment: String,
    #[serde(default)]
    claim: String,
}

fn parse_sentiment(raw: &str) -> SentimentLabel {
    match raw.trim().to_ascii_lowercase().as_str() {
        "positive" => SentimentLabel::Positive,
        "negative" => SentimentLabel::Negative,
        _ => SentimentLabel::Neutral,
    }
}

/// Extracts attribute-level claims about brands in `category`.
///
/// When `canon` is given, claims about brands it cannot resolve are dropped
/// and the rest are rewritten to canonical names.
pub async fn extract_claims(
    llm: &dyn Provider,
    responses: &[&str],
    subject: &str,
    category: &str,
    canon: Option<&Canonicalizer>,
) -> Vec<BrandClaim> {
    let chunks = chunk_responses(responses, CLAIM_CHUNK_CHARS);
    let prompts: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            format!(
                r#"Read these AI responses about "{subject}" ({category}) and extract factual claims made about specific brands.

For each claim return an object with:
- "brand": the brand the claim is about
- "attribute": a one or two word theme (e.g. "pricing", "ease of use", "integrations")
- "sentiment": "positive", "negative" or "neutral"
- "claim": the claim in under 25 words

Return ONLY a valid JSON array of such objects.

AI RESPONSES:
{chunk}

JSON array of claims:"#
            )
        })
        .collect();

    let replies = futures::future::join_all(prompts.iter().map(|p| ask(llm, p))).await;

    let mut claims = Vec::new();
    for (idx, reply) in replies.into_iter().enumerate() {
        let raw = match reply
            .map_err(|e| e.to_string())
            .and_then(|text| parse_llm_json::<Vec<RawClaim>>(&text))
        {
            Ok(raw) => raw,
            Err(error) => {
                warn!(target: "geoprobe.extract", stage = "extract.claims_chunk_failed", chunk = idx, %error);
                continue;
            }
        };
        for c in raw {
            let brand = c.brand.trim();
            if brand.is_empty() || c.claim.trim().is_empty() {
                continue;
            }
            let brand = match canon {
                Some(canon) => match canon.resolve(brand) {
                    Some(b) => b.to_string(),
                    None => continue,
                },
                None => brand.to_string(),
            };
            claims.push(BrandClaim {
                brand,
                attribute: c.attribute.trim().to_lowercase(),
                sentiment: parse_sentiment(&c.sentiment),
                claim: c.claim.trim().to_string(),
            });
        }
    }
    claims.truncate(MAX_CLAIMS);
    info!(target: "geoprobe.extract", stage = "extract.claims", chunks = chunks.len(), claims = claims.len());
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::testing::ScriptedLlm;

    #[tokio::test]
    async fn claims_are_canonicalised_and_filtered() {
        let llm = ScriptedLlm::new().reply(
            "JSON array of claims",
            r#"```json
[{"brand": "acme", "attribute": "Pricing", "sentiment": "POSITIVE", "claim": "Cheap plans"},
 {"brand": "Nobody", "attribute": "x", "sentiment": "negative", "claim": "dropped"},
 {"brand": "Beta", "attribute": "support", "sentiment": "meh", "claim": "Slow support"},
 {"brand": "Beta", "claim": ""}]
```"#,
        );
        let brands = vec!["Acme".to_string(), "Beta".to_string()];
        let canon = Canonicalizer::new(&brands, &BTreeMap::new());

        let claims = extract_claims(&llm, &["resp"], "CRM", "CRM", Some(&canon)).await;
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].brand, "Acme");
        assert_eq!(claims[0].attribute, "pricing");
        assert_eq!(claims[0].sentiment, SentimentLabel::Positive);
        assert_eq!(claims[1].sentiment, SentimentLabel::Neutral);
    }
}
