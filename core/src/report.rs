//! JSON and Markdown report documents for finished runs.

use std::fmt::Write;

use serde::Serialize;

use crate::context::RunContext;
use crate::types::{AnalysisResult, BrandProfile, ExecutionStatus, LeaderboardResult};

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub brand: String,
    pub generated_at: String,
    pub profile: Option<BrandProfile>,
    pub query_count: usize,
    pub providers: Vec<String>,
    pub execution: Option<ExecutionSummary>,
    pub analysis: Option<AnalysisResult>,
}

impl RunReport {
    pub fn from_context(ctx: &RunContext) -> Self {
        let run = ctx.execution_run.as_ref();
        Self {
            run_id: ctx.run_id().to_string(),
            brand: ctx.brand.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            profile: ctx.brand_profile.clone(),
            query_count: ctx.query_set.as_ref().map_or(0, |q| q.total_count),
            providers: run.map(|r| r.providers.clone()).unwrap_or_default(),
            execution: run.map(|r| ExecutionSummary {
                total: r.total_queries,
                completed: r.completed_queries,
                failed: r.failed_queries,
                status: r.status,
            }),
            analysis: ctx.analysis_result.clone(),
        }
    }
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

fn bullets(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n### {title}\n");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}

pub fn render_run_markdown(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# GEO Report: {}\n", report.brand);
    let _ = writeln!(out, "- Run: `{}`", report.run_id);
    let _ = writeln!(out, "- Generated: {}", report.generated_at);
    let _ = writeln!(out, "- Queries: {}", report.query_count);
    if !report.providers.is_empty() {
        let _ = writeln!(out, "- Providers: {}", report.providers.join(", "));
    }
    if let Some(exec) = &report.execution {
        let _ = writeln!(
            out,
            "- Responses: {} ok / {} failed of {} ({:?})",
            exec.completed, exec.failed, exec.total, exec.status
        );
    }

    let Some(a) = &report.analysis else {
        out.push_str("\nNo analysis available.\n");
        return out;
    };

    let _ = writeln!(out, "\n## Summary\n");
    let _ = writeln!(out, "**{}**\n", a.summary.headline);
    let _ = writeln!(out, "Overall score: **{:.1}/100**\n", a.summary.overall_score);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Mention rate | {} |", pct(a.mention_rate.overall));
    let _ = writeln!(out, "| Mindshare | {} (rank {}) |", pct(a.mindshare.overall), a.mindshare.rank);
    let _ = writeln!(out, "| Weighted visibility | {:.3} |", a.rank_position.weighted_visibility);
    let _ = writeln!(out, "| Sentiment | {:.3} ({}) |", a.sentiment.overall, a.sentiment.label.as_str());
    let _ = writeln!(out, "| Citation rate | {} |", pct(a.citations.citation_rate));

    if !a.mention_rate.by_provider.is_empty() {
        let _ = writeln!(out, "\n## Mention rate by provider\n");
        for (provider, rate) in &a.mention_rate.by_provider {
            let _ = writeln!(out, "- {provider}: {}", pct(*rate));
        }
    }

    if !a.positioning.attributes.is_empty() {
        let _ = writeln!(out, "\n## Positioning\n");
        let _ = writeln!(out, "Primary position: **{}**\n", a.positioning.primary_position);
        for attr in &a.positioning.attributes {
            let _ = writeln!(out, "- {} ({}x, {:.2})", attr.attribute, attr.frequency, attr.sentiment);
        }
    }

    if !a.competitor_analysis.competitors.is_empty() {
        let _ = writeln!(out, "\n## Competitors\n");
        let _ = writeln!(out, "| Brand | Mindshare | Mention rate | Sentiment |");
        let _ = writeln!(out, "|---|---|---|---|");
        for c in &a.competitor_analysis.competitors {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {:.2} |",
                c.name,
                pct(c.mindshare),
                pct(c.mention_rate),
                c.sentiment
            );
        }
    }

    bullets(&mut out, "Key findings", &a.summary.key_findings);
    bullets(&mut out, "Strengths", &a.summary.strengths);
    bullets(&mut out, "Weaknesses", &a.summary.weaknesses);
    bullets(&mut out, "Recommendations", &a.summary.recommendations);
    out
}

pub fn render_leaderboard_markdown(result: &LeaderboardResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Leaderboard: {}\n", result.category);
    let _ = writeln!(out, "- Run: `{}`", result.run_id);
    let _ = writeln!(out, "- Analyzed: {}", result.analyzed_at);
    let _ = writeln!(out, "- Queries: {}", result.total_queries);
    let _ = writeln!(out, "- Providers: {}", result.providers_used.join(", "));
    let _ = writeln!(out, "- Brands: {}\n", result.brands.len());

    if let Some(after) = &result.stopped_after {
        let _ = writeln!(out, "Stopped after `{after}`; no rankings computed.");
        return out;
    }

    let _ = writeln!(out, "| # | Brand | Score | Mention rate | Mindshare | Visibility | Sentiment |");
    let _ = writeln!(out, "|---|---|---|---|---|---|---|");
    for e in &result.entries {
        let _ = writeln!(
            out,
            "| {} | {} | {:.1} | {} | {} | {:.3} | {:.2} ({}) |",
            e.rank,
            e.brand,
            e.overall_score,
            pct(e.mention_rate),
            pct(e.mindshare),
            e.rank_position_score,
            e.sentiment_score,
            e.sentiment_label.as_str()
        );
    }
    out
}
