use chrono::Datelike;

use crate::types::{BrandProfile, QueryStrategy};

const FORMAT_RULES: &str = "RULES:
- NEVER include any specific brand or company name in the query text
- Write queries the way a real person types them into an AI assistant
- Do NOT use placeholder brackets
- One query per line in this format:

<query text> | <category> | <intent>

Categories: recommendation, comparison, best-of, how-to, review, alternative, general";

fn join_or(items: &[String], fallback: &str, take: usize) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.iter().take(take).cloned().collect::<Vec<_>>().join(", ")
    }
}

fn context_block(profile: &BrandProfile) -> String {
    format!(
        "CONTEXT:\n- Category: {}\n- Industry: {}\n- Keywords: {}\n- Target audience: {}\n- Year: {}",
        profile.category,
        profile.industry,
        join_or(&profile.keywords, &profile.category, 8),
        join_or(&profile.target_audience, "general", 5),
        chrono::Utc::now().year(),
    )
}

fn goal(strategy: QueryStrategy, profile: &BrandProfile) -> String {
    let category = &profile.category;
    match strategy {
        QueryStrategy::Keyword => format!(
            "Generate discovery, evaluation, feature, pricing and problem-framing queries people ask when researching the \"{category}\" space. Mix short queries with longer conversational ones."
        ),
        QueryStrategy::Persona => format!(
            "Generate queries asked by different user personas (founder, IT manager, freelancer, procurement lead, ...) researching \"{category}\" solutions. Append a fourth pipe field naming the persona."
        ),
        QueryStrategy::Competitor => format!(
            "Generate queries about the competitive landscape of \"{category}\": alternatives, switching, comparisons between unnamed leaders, and market overviews. Competitors to keep in mind (never name them): {}.",
            join_or(&profile.competitors, "n/a", 8)
        ),
        QueryStrategy::Intent => format!(
            "Generate queries covering different search intents (informational, navigational, commercial, transactional) for \"{category}\". Use the intent name as the intent label."
        ),
        QueryStrategy::DirectRec => format!(
            "Generate queries that DIRECTLY ask for recommendations of \"{category}\" (best, top, recommend, which, who, list). Every query must force an answer that names multiple brands."
        ),
        QueryStrategy::Vertical => format!(
            "Generate queries asking for the best \"{category}\" for a DIFFERENT specific vertical, niche, company size or geography each time. Every answer must name specific brands."
        ),
        QueryStrategy::Comparison => format!(
            "Generate queries that ask an AI to RANK, COMPARE, or PICK WINNERS among \"{category}\" (rank the top 10, tier list, best track record). Answers must contain ranked brand names."
        ),
        QueryStrategy::Scenario => format!(
            "Generate realistic buyer scenarios where someone needs a specific \"{category}\" recommendation for their situation (\"I run a 20-person agency and need...\")."
        ),
    }
}

/// Full generation prompt for one strategy.
pub fn strategy_prompt(strategy: QueryStrategy, profile: &BrandProfile, count: usize) -> String {
    format!(
        "You are a GEO (Generative Engine Optimization) specialist.\n\n{}\n\n{}\n\n{}\n\nGenerate exactly {count} queries:",
        goal(strategy, profile),
        context_block(profile),
        FORMAT_RULES,
    )
}
