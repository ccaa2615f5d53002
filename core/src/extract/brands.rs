use tracing::{debug, warn};

use super::ask;
use crate::provider::Provider;
use crate::util::{eq_ignore_case, parse_llm_json, truncate_chars};

/// Per-chunk character budget for extraction prompts.
pub const CHUNK_CHAR_BUDGET: usize = 24_000;

const SEPARATOR: &str = "\n---\n";
const COMPETITOR_CHAR_BUDGET: usize = 12_000;

/// Category framing passed to the extraction prompt.
#[derive(Debug, Clone, Default)]
pub struct BrandExtractionContext {
    pub category: String,
    pub industry: String,
    pub keywords: Vec<String>,
    pub sample_queries: Vec<String>,
}

/// Packs responses into chunks of at most `budget` chars. A single response
/// larger than the budget is truncated into its own chunk.
pub fn chunk_responses(responses: &[&str], budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for resp in responses {
        let piece = truncate_chars(resp.trim(), budget);
        if piece.is_empty() {
            continue;
        }
        let piece_len = piece.chars().count();
        let extra = if current.is_empty() {
            piece_len
        } else {
            piece_len + SEPARATOR.len()
        };
        if !current.is_empty() && current_len + extra > budget {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push_str(SEPARATOR);
            current_len += SEPARATOR.len();
        }
        current.push_str(piece);
        current_len += piece_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn brand_prompt(ctx: &BrandExtractionContext, chunk: &str) -> String {
    let keywords = if ctx.keywords.is_empty() {
        String::new()
    } else {
        format!("\nRelated keywords: {}", ctx.keywords.join(", "))
    };
    let samples = if ctx.sample_queries.is_empty() {
        String::new()
    } else {
        format!(
            "\nThe responses answer questions such as:\n- {}",
            ctx.sample_queries.join("\n- ")
        )
    };
    format!(
        r#"Extract every brand, company or product that is itself a "{category}" (industry: {industry}) and is recommended or discussed in the AI responses below.{keywords}{samples}

RULES:
- Only include names that ARE {category}, not their customers, investors, partners or case-study examples
- Exclude generic terms, technologies and acronyms that are not brands
- Use the most complete official name that appears in the text
- Return ONLY a valid JSON array of strings, nothing else

AI RESPONSES:
{chunk}

JSON array of brand names:"#,
        category = ctx.category,
        industry = ctx.industry,
    )
}

/// Extracts category brands from `responses`, merging chunk results by
/// case-insensitive name in first-seen order and capping at `max_brands`.
pub async fn extract_brands(
    llm: &dyn Provider,
    ctx: &BrandExtractionContext,
    responses: &[&str],
    max_brands: usize,
) -> Vec<String> {
    let chunks = chunk_responses(responses, CHUNK_CHAR_BUDGET);
    debug!(target: "geoprobe.extract", stage = "extract.brands", chunks = chunks.len(), responses = responses.len());

    let prompts: Vec<String> = chunks.iter().map(|chunk| brand_prompt(ctx, chunk)).collect();
    let replies = futures::future::join_all(prompts.iter().map(|p| ask(llm, p))).await;

    let mut merged: Vec<String> = Vec::new();
    for (idx, reply) in replies.into_iter().enumerate() {
        let names = match reply
            .map_err(|e| e.to_string())
            .and_then(|text| parse_llm_json::<Vec<String>>(&text))
        {
            Ok(names) => names,
            Err(error) => {
                warn!(target: "geoprobe.extract", stage = "extract.brands_chunk_failed", chunk = idx, %error);
                continue;
            }
        };
        for name in names {
            let name = name.trim();
            if name.is_empty() || merged.iter().any(|m| eq_ignore_case(m, name)) {
                continue;
            }
            merged.push(name.to_string());
        }
    }
    merged.truncate(max_brands);
    merged
}

/// Single-brand variant: competitor names mentioned alongside `target`.
pub async fn extract_competitors(
    llm: &dyn Provider,
    responses: &[&str],
    target: &str,
    category: &str,
    max_competitors: usize,
) -> Vec<String> {
    let combined = responses.join(SEPARATOR);
    let combined = truncate_chars(&combined, COMPETITOR_CHAR_BUDGET);
    let prompt = format!(
        r#"Extract all company, brand, and product names mentioned in the following AI responses about the "{category}" industry.

RULES:
- Only include real companies, brands, or product names
- Exclude "{target}" (that is our target brand)
- Exclude generic terms, technologies, acronyms, and non-brand words
- Order by how frequently they appear (most frequent first)
- Return at most {max_competitors} names
- Return ONLY a valid JSON array of strings, nothing else

AI RESPONSES:
{combined}

JSON array of brand names:"#
    );

    let names = match ask(llm, &prompt)
        .await
        .map_err(|e| e.to_string())
        .and_then(|text| parse_llm_json::<Vec<String>>(&text))
    {
        Ok(names) => names,
        Err(error) => {
            warn!(target: "geoprobe.extract", stage = "extract.competitors_failed", target, %error);
            return Vec::new();
        }
    };

    let mut out: Vec<String> = Vec::new();
    for name in names {
        let name = name.trim().to_string();
        if name.is_empty() || eq_ignore_case(&name, target) || out.iter().any(|o| eq_ignore_case(o, &name)) {
            continue;
        }
        out.push(name);
    }
    out.truncate(max_competitors);
    out
}
