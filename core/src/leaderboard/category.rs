use serde::Deserialize;
use tracing::warn;

use crate::error::GeoError;
use crate::provider::Provider;
use crate::types::BrandProfile;
use crate::util::parse_llm_json;

/// Substring every category-context prompt contains.
pub const CATEGORY_PROMPT_MARKER: &str = "provide context for generating search queries";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CategoryReply {
    industry: String,
    category: String,
    keywords: Vec<String>,
}

/// Asks the processing provider for industry, label and keywords of
/// `category`. No brands are requested here; they are discovered later from
/// the responses. An unparseable reply falls back to the raw category name.
pub async fn fetch_category_context(llm: &dyn Provider, category: &str) -> Result<BrandProfile, GeoError> {
    let prompt = format!(
        r#"For the category "{category}", {CATEGORY_PROMPT_MARKER}.

Return ONLY a valid JSON object:
- "industry": the industry (e.g. "venture capital", "CRM software")
- "category": a short label (e.g. "VC firms", "CRM tools")
- "keywords": array of 5-10 relevant keywords

JSON object:"#
    );
    let reply = llm
        .query(&prompt)
        .await
        .map_err(|e| GeoError::pipeline("category-context", format!("category context failed: {e}")))?;

    let parsed = parse_llm_json::<CategoryReply>(&reply.text).unwrap_or_else(|error| {
        warn!(target: "geoprobe.leaderboard", stage = "category.parse_failed", %error);
        CategoryReply::default()
    });
    let or_raw = |s: String| if s.trim().is_empty() { category.to_string() } else { s };
    let label = or_raw(parsed.category);

    Ok(BrandProfile {
        name: label.clone(),
        description: format!("Category leaderboard for {category}"),
        industry: or_raw(parsed.industry),
        category: label,
        keywords: parsed.keywords,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    #[tokio::test]
    async fn parses_context_and_falls_back_on_garbage() {
        let llm = ScriptedLlm::new().reply(
            CATEGORY_PROMPT_MARKER,
            r#"```json
{"industry": "software", "category": "CRM tools", "keywords": ["crm", "sales"]}
```"#,
        );
        let profile = fetch_category_context(&llm, "crm").await.unwrap();
        assert_eq!(profile.category, "CRM tools");
        assert_eq!(profile.name, "CRM tools");
        assert_eq!(profile.keywords, vec!["crm", "sales"]);

        let llm = ScriptedLlm::new().reply(CATEGORY_PROMPT_MARKER, "no idea");
        let profile = fetch_category_context(&llm, "crm").await.unwrap();
        assert_eq!(profile.category, "crm");
        assert_eq!(profile.industry, "crm");
    }
}
