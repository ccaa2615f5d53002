//! Relative artifact paths inside a run directory. These names are the
//! resume contract; renaming one orphans every existing run.

use std::collections::HashSet;

pub const METADATA: &str = "metadata.json";
pub const BRAND_PROFILE: &str = "brand-profile.json";
pub const CATEGORY_PROFILE: &str = "category-profile.json";
pub const QUERIES: &str = "queries.json";
pub const RESULTS: &str = "results/results.json";
pub const EXTRACTION_CHECKPOINT: &str = "analysis/extraction-checkpoint.json";
pub const LEADERBOARD: &str = "analysis/leaderboard.json";
pub const ANALYSIS: &str = "analysis/analysis.json";
pub const SNAPSHOT: &str = "analysis/snapshot.json";
pub const REPORT_JSON: &str = "reports/report.json";
pub const REPORT_MD: &str = "reports/report.md";
pub const LEADERBOARD_REPORT_JSON: &str = "reports/leaderboard.json";
pub const LEADERBOARD_REPORT_MD: &str = "reports/leaderboard.md";

/// Subdirectories created with every run.
pub const RUN_SUBDIRS: &[&str] = &["results/by-provider", "analysis", "reports"];

/// Directory prefixes recognised by `list_runs`.
pub const RUN_PREFIXES: &[&str] = &["run-", "lb-"];

const RESERVED_SLUGS: &[&str] = &[
    "leaderboard",
    "extraction-checkpoint",
    "analysis",
    "snapshot",
    "summary",
];

/// A run id is a single path component: no separators and no `..`.
pub fn is_valid_run_id(run_id: &str) -> bool {
    !run_id.is_empty()
        && run_id != "."
        && !run_id.contains("..")
        && !run_id.chars().any(|c| c == '/' || c == '\\' || c == '\0')
}

pub fn by_provider(provider: &str) -> String {
    format!("results/by-provider/{}.json", slugify(provider))
}

/// One analysis path per brand, index-aligned with `brands`. Brands whose
/// slugs collide get `-2`, `-3`, ... in discovery order.
pub fn brand_analysis_files(brands: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    brands
        .iter()
        .map(|brand| {
            let base = brand_slug(brand);
            let mut slug = base.clone();
            let mut n = 2;
            while !taken.insert(slug.clone()) {
                slug = format!("{base}-{n}");
                n += 1;
            }
            format!("analysis/{slug}.json")
        })
        .collect()
}

/// Lowercase; every run of non-alphanumeric characters becomes one `-`.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// File-safe brand slug that cannot shadow a reserved analysis artifact.
pub fn brand_slug(brand: &str) -> String {
    let slug = slugify(brand);
    if slug.is_empty() {
        return "brand-unnamed".to_string();
    }
    if RESERVED_SLUGS.contains(&slug.as_str()) {
        return format!("brand-{slug}");
    }
    slug
}
