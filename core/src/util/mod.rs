pub mod json;
pub mod text;

pub use json::parse_llm_json;
pub use text::{
    contains_brand, count_mentions, eq_ignore_case, normalize_name, split_sentences, truncate_chars,
};
