use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryCategory {
    Recommendation,
    Comparison,
    BestOf,
    HowTo,
    Review,
    Alternative,
    General,
}

impl QueryCategory {
    /// Lenient parse for LLM output; unknown labels fall back to `General`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recommendation" => Self::Recommendation,
            "comparison" => Self::Comparison,
            "best-of" => Self::BestOf,
            "how-to" => Self::HowTo,
            "review" => Self::Review,
            "alternative" => Self::Alternative,
            _ => Self::General,
        }
    }
}

/// Prompt family a query was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryStrategy {
    Keyword,
    Persona,
    Competitor,
    Intent,
    DirectRec,
    Vertical,
    Comparison,
    Scenario,
}

impl QueryStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Persona => "persona",
            Self::Competitor => "competitor",
            Self::Intent => "intent",
            Self::DirectRec => "direct-rec",
            Self::Vertical => "vertical",
            Self::Comparison => "comparison",
            Self::Scenario => "scenario",
        }
    }

    /// Short id prefix used for generated query ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Keyword => "kw",
            Self::Persona => "pe",
            Self::Competitor => "co",
            Self::Intent => "in",
            Self::DirectRec => "dr",
            Self::Vertical => "ve",
            Self::Comparison => "cmp",
            Self::Scenario => "sc",
        }
    }
}

impl fmt::Display for QueryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub id: String,
    pub text: String,
    pub category: QueryCategory,
    pub strategy: QueryStrategy,
    #[serde(default)]
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySet {
    pub brand: String,
    pub queries: Vec<GeneratedQuery>,
    pub generated_at: String,
    pub total_count: usize,
}

impl QuerySet {
    pub fn new(brand: impl Into<String>, queries: Vec<GeneratedQuery>) -> Self {
        let total_count = queries.len();
        Self {
            brand: brand.into(),
            queries,
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
