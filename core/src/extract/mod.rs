//! LLM-backed extraction over collected provider responses.
//!
//! Every helper here treats the processing model as unreliable: malformed
//! or failed replies degrade to less data, never to an aborted run, unless
//! the caller decides an empty result is fatal.

mod brands;
mod dedup;
mod narratives;
mod ranking;

use crate::error::ProviderError;
use crate::provider::Provider;

pub use brands::{chunk_responses, extract_brands, extract_competitors, BrandExtractionContext};
pub use dedup::{apply_alias_suggestions, deduplicate_brands, merge_substrings, Canonicalizer, DedupResult};
pub use narratives::extract_claims;
pub use ranking::{extract_ranked_lists, looks_ranked};

async fn ask(llm: &dyn Provider, prompt: &str) -> Result<String, ProviderError> {
    llm.query(prompt).await.map(|r| r.text)
}
