use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::analysis::{analyze_brand, AnalyzerInputs, AnalyzerKind};
use crate::config::{AppConfig, ReportFormat};
use crate::context::{new_run_id, Services};
use crate::error::GeoError;
use crate::executor::{emit, run_bounded, ExecutionEngine, ExecutionOpts, RenderEvent};
use crate::extract::{
    deduplicate_brands, extract_brands, extract_claims, extract_ranked_lists, BrandExtractionContext,
    Canonicalizer,
};
use crate::queries::{generate_queries, LEADERBOARD_STRATEGIES};
use crate::report::render_leaderboard_markdown;
use crate::storage::{layout, StorageExt};
use crate::types::{
    AnalysisResult, BrandProfile, ExecutionRun, ExtractionCheckpoint, LeaderboardEntry,
    LeaderboardResult, QueryResult, QuerySet, RunMetadata,
};

use super::category::fetch_category_context;
use super::phase::LeaderboardPhase;

pub const DEFAULT_MAX_BRANDS: usize = 50;
const MAX_ANALYSIS_WORKERS: usize = 64;
const SAMPLE_QUERIES: usize = 5;

pub struct LeaderboardArgs {
    /// Category as typed by the user, e.g. "CRM software".
    pub category: String,
    pub cfg: AppConfig,
    pub max_brands: usize,
    pub resume_run_id: Option<String>,
    /// Phase name after which the run halts.
    pub stop_after: Option<String>,
    pub show_progress: bool,
}

impl LeaderboardArgs {
    pub fn new(category: impl Into<String>, cfg: AppConfig) -> Self {
        Self {
            category: category.into(),
            cfg,
            max_brands: DEFAULT_MAX_BRANDS,
            resume_run_id: None,
            stop_after: None,
            show_progress: false,
        }
    }
}

/// Drives the six leaderboard phases. Every phase first looks for its
/// checkpoint and skips itself when one exists; per-brand analysis resumes
/// brand by brand.
pub struct LeaderboardOrchestrator {
    services: Services,
}

impl LeaderboardOrchestrator {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub async fn run(&self, args: LeaderboardArgs) -> Result<LeaderboardResult, GeoError> {
        let stop_after = args
            .stop_after
            .as_deref()
            .map(str::parse::<LeaderboardPhase>)
            .transpose()?;
        let storage = self.services.storage.as_ref();

        let (run_id, started_at) = match args.resume_run_id.as_deref() {
            Some(id) => {
                if !storage.run_exists(id).await {
                    return Err(GeoError::RunNotFound(id.to_string()));
                }
                let meta: Option<RunMetadata> = storage.load(id, layout::METADATA).await?;
                storage.create_run_dir(id).await?;
                info!(target: "geoprobe.leaderboard", stage = "leaderboard.resume", run_id = id);
                let started_at = meta
                    .map(|m| m.started_at)
                    .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
                (id.to_string(), started_at)
            }
            None => {
                let id = new_run_id("lb");
                storage.create_run_dir(&id).await?;
                (id, chrono::Utc::now().to_rfc3339())
            }
        };

        let mut meta = RunMetadata::new(&run_id, "leaderboard", started_at);
        meta.category = Some(args.category.clone());
        storage.save_metadata(&meta).await?;

        emit(
            &self.services.renderer,
            RenderEvent::RunStart {
                run_id: run_id.clone(),
                kind: "leaderboard".into(),
                subject: args.category.clone(),
            },
        );
        info!(target: "geoprobe.leaderboard", stage = "leaderboard.start", run_id = %run_id, category = %args.category);

        let started = Instant::now();
        let flow = LeaderboardRun {
            services: &self.services,
            run_id: &run_id,
            args: &args,
            stop_after,
        };
        let result = flow.execute().await;

        let status = match &result {
            Ok(r) => match &r.stopped_after {
                Some(phase) => format!("stopped-after-{phase}"),
                None => "completed".to_string(),
            },
            Err(_) => "failed".to_string(),
        };
        match &result {
            Ok(r) => meta.brands = r.brands.clone(),
            Err(err) => meta.errors.push(err.to_string()),
        }
        if let Err(error) = storage.save_metadata(&meta.clone().finish(status.clone())).await {
            warn!(target: "geoprobe.storage", stage = "metadata.write_failed", run_id = %run_id, %error);
        }

        if let Ok(LeaderboardResult {
            stopped_after: Some(after),
            ..
        }) = &result
        {
            emit(
                &self.services.renderer,
                RenderEvent::Stopped {
                    run_id: run_id.clone(),
                    after: after.clone(),
                },
            );
        }
        emit(
            &self.services.renderer,
            RenderEvent::RunEnd {
                run_id: run_id.clone(),
                status: status.clone(),
                duration_ms: started.elapsed().as_millis() as u64,
                errors: meta.errors.clone(),
            },
        );
        match &result {
            Ok(_) => info!(target: "geoprobe.leaderboard", stage = "leaderboard.end", run_id = %run_id, status = %status),
            Err(error) => warn!(target: "geoprobe.leaderboard", stage = "leaderboard.failed", run_id = %run_id, %error),
        }
        result
    }
}

/// Inputs shared read-only by every per-brand analysis task.
struct SharedInputs {
    run_id: String,
    base: BrandProfile,
    results: Vec<QueryResult>,
    checkpoint: ExtractionCheckpoint,
    /// Analysis artifact per brand, index-aligned with `checkpoint.brands`.
    files: Vec<String>,
    kinds: Vec<AnalyzerKind>,
}

/// Analysis paths recorded in the checkpoint, or a fresh assignment when the
/// recorded map does not cover every brand with distinct files.
fn analysis_files(checkpoint: &ExtractionCheckpoint) -> Vec<String> {
    let recorded: Option<Vec<String>> = checkpoint
        .brands
        .iter()
        .map(|b| checkpoint.analysis_files.get(b).cloned())
        .collect();
    match recorded {
        Some(files) if files.iter().collect::<HashSet<_>>().len() == files.len() => files,
        _ => layout::brand_analysis_files(&checkpoint.brands),
    }
}

fn analyze_for(shared: &SharedInputs, brand: &str) -> AnalysisResult {
    let competitors: Vec<String> = shared
        .checkpoint
        .brands
        .iter()
        .filter(|b| b.as_str() != brand)
        .cloned()
        .collect();
    let profile = BrandProfile {
        name: brand.to_string(),
        competitors: competitors.clone(),
        ..shared.base.clone()
    };
    analyze_brand(
        &shared.run_id,
        AnalyzerInputs {
            results: &shared.results,
            profile: &profile,
            competitors: &competitors,
            ranked_lists: &shared.checkpoint.ranked_lists_by_response,
            claims: &shared.checkpoint.extracted_claims,
        },
        &shared.kinds,
    )
}

/// Stable sort by descending score, so ties keep discovery order.
fn rank_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
}

/// State of one invocation.
struct LeaderboardRun<'a> {
    services: &'a Services,
    run_id: &'a str,
    args: &'a LeaderboardArgs,
    stop_after: Option<LeaderboardPhase>,
}

impl LeaderboardRun<'_> {
    async fn execute(&self) -> Result<LeaderboardResult, GeoError> {
        let profile = self.category_context().await?;
        if self.stops_at(LeaderboardPhase::CategoryContext) {
            return Ok(self.stopped(LeaderboardPhase::CategoryContext, Vec::new(), 0, None));
        }

        let queries = self.query_generation(&profile).await?;
        if self.stops_at(LeaderboardPhase::QueryGeneration) {
            return Ok(self.stopped(LeaderboardPhase::QueryGeneration, Vec::new(), queries.total_count, None));
        }

        let execution = self.execution(&profile, &queries).await?;
        let usable: Vec<&QueryResult> = execution.usable_results().collect();
        if usable.is_empty() {
            return Err(GeoError::pipeline(
                LeaderboardPhase::Execution.as_str(),
                "No valid responses received from any provider",
            ));
        }
        let providers = Some(execution.providers.clone());
        if self.stops_at(LeaderboardPhase::Execution) {
            return Ok(self.stopped(LeaderboardPhase::Execution, Vec::new(), queries.total_count, providers));
        }

        let checkpoint = self.extraction(&profile, &queries, &usable).await?;
        if self.stops_at(LeaderboardPhase::Extraction) {
            return Ok(self.stopped(
                LeaderboardPhase::Extraction,
                checkpoint.brands.clone(),
                queries.total_count,
                providers,
            ));
        }

        let brands = checkpoint.brands.clone();
        let entries = self.analysis(&profile, &execution, checkpoint).await?;
        if self.stops_at(LeaderboardPhase::Analysis) {
            return Ok(self.stopped(LeaderboardPhase::Analysis, brands, queries.total_count, providers));
        }

        self.ranking(entries, brands, queries.total_count, execution.providers.clone())
            .await
    }

    fn stops_at(&self, phase: LeaderboardPhase) -> bool {
        self.stop_after == Some(phase)
    }

    fn stopped(
        &self,
        phase: LeaderboardPhase,
        brands: Vec<String>,
        total_queries: usize,
        providers: Option<Vec<String>>,
    ) -> LeaderboardResult {
        info!(target: "geoprobe.leaderboard", stage = "leaderboard.stopped", run_id = self.run_id, after = %phase);
        LeaderboardResult {
            run_id: self.run_id.to_string(),
            category: self.args.category.clone(),
            brands,
            entries: Vec::new(),
            total_queries,
            providers_used: providers.unwrap_or_else(|| self.services.providers.names()),
            analyzed_at: chrono::Utc::now().to_rfc3339(),
            stopped_after: Some(phase.as_str().to_string()),
        }
    }

    fn begin(&self, phase: LeaderboardPhase) -> Instant {
        info!(target: "geoprobe.leaderboard", stage = "phase.start", run_id = self.run_id, phase = %phase);
        emit(
            &self.services.renderer,
            RenderEvent::PhaseStart {
                run_id: self.run_id.to_string(),
                phase: phase.as_str().to_string(),
                description: phase.description().to_string(),
            },
        );
        Instant::now()
    }

    fn end(&self, phase: LeaderboardPhase, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(target: "geoprobe.leaderboard", stage = "phase.end", run_id = self.run_id, phase = %phase, duration_ms);
        emit(
            &self.services.renderer,
            RenderEvent::PhaseEnd {
                run_id: self.run_id.to_string(),
                phase: phase.as_str().to_string(),
                duration_ms,
            },
        );
    }

    fn skip(&self, phase: LeaderboardPhase, reason: &str) {
        info!(target: "geoprobe.leaderboard", stage = "phase.skipped", run_id = self.run_id, phase = %phase, reason);
        emit(
            &self.services.renderer,
            RenderEvent::PhaseSkipped {
                run_id: self.run_id.to_string(),
                phase: phase.as_str().to_string(),
                reason: reason.to_string(),
            },
        );
    }

    async fn category_context(&self) -> Result<BrandProfile, GeoError> {
        let phase = LeaderboardPhase::CategoryContext;
        let storage = &self.services.storage;
        if let Some(profile) = storage
            .load::<BrandProfile>(self.run_id, layout::CATEGORY_PROFILE)
            .await?
        {
            self.skip(phase, "category profile checkpoint found");
            return Ok(profile);
        }

        let started = self.begin(phase);
        let profile = fetch_category_context(self.services.processing.as_ref(), &self.args.category).await?;
        storage
            .save(self.run_id, layout::CATEGORY_PROFILE, &profile)
            .await?;
        self.end(phase, started);
        Ok(profile)
    }

    async fn query_generation(&self, profile: &BrandProfile) -> Result<QuerySet, GeoError> {
        let phase = LeaderboardPhase::QueryGeneration;
        let storage = &self.services.storage;
        if let Some(set) = storage
            .load::<QuerySet>(self.run_id, layout::QUERIES)
            .await?
            .filter(|q| !q.is_empty())
        {
            self.skip(phase, "query checkpoint found");
            return Ok(set);
        }

        let started = self.begin(phase);
        let queries = generate_queries(
            self.services.processing.as_ref(),
            profile,
            &LEADERBOARD_STRATEGIES,
            self.args.cfg.queries.count,
        )
        .await?;
        let set = QuerySet::new(profile.category.clone(), queries);
        storage.save(self.run_id, layout::QUERIES, &set).await?;
        self.end(phase, started);
        Ok(set)
    }

    async fn execution(&self, profile: &BrandProfile, queries: &QuerySet) -> Result<ExecutionRun, GeoError> {
        let phase = LeaderboardPhase::Execution;
        if let Some(run) = self
            .services
            .storage
            .load::<ExecutionRun>(self.run_id, layout::RESULTS)
            .await?
            .filter(|r| !r.results.is_empty())
        {
            self.skip(phase, "results checkpoint found");
            return Ok(run);
        }

        let started = self.begin(phase);
        let mut opts = ExecutionOpts::from_config(&self.args.cfg.execution);
        opts.show_progress = self.args.show_progress;
        let engine = ExecutionEngine::builder(opts, self.services.storage.clone())
            .maybe_renderer(self.services.renderer.clone())
            .maybe_retry_strategy(self.services.retry_strategy.clone())
            .build();
        let providers = self.services.providers.enabled();
        let run = engine
            .execute(self.run_id, &profile.category, &queries.queries, &providers)
            .await?;
        self.end(phase, started);
        Ok(run)
    }

    async fn extraction(
        &self,
        profile: &BrandProfile,
        queries: &QuerySet,
        usable: &[&QueryResult],
    ) -> Result<ExtractionCheckpoint, GeoError> {
        let phase = LeaderboardPhase::Extraction;
        let storage = &self.services.storage;
        if let Some(checkpoint) = storage
            .load::<ExtractionCheckpoint>(self.run_id, layout::EXTRACTION_CHECKPOINT)
            .await?
        {
            self.skip(phase, "extraction checkpoint found");
            return Ok(checkpoint);
        }

        let started = self.begin(phase);
        let llm = self.services.processing.as_ref();
        let category = &profile.category;
        let responses: Vec<&str> = usable.iter().map(|r| r.response.as_str()).collect();

        let ctx = BrandExtractionContext {
            category: category.clone(),
            industry: profile.industry.clone(),
            keywords: profile.keywords.clone(),
            sample_queries: queries
                .queries
                .iter()
                .take(SAMPLE_QUERIES)
                .map(|q| q.text.clone())
                .collect(),
        };
        let raw = extract_brands(llm, &ctx, &responses, self.args.max_brands).await;
        if raw.is_empty() {
            return Err(GeoError::pipeline(phase.as_str(), "No brands found in AI responses"));
        }

        let dedup = deduplicate_brands(llm, &raw, category).await;
        info!(
            target: "geoprobe.leaderboard",
            stage = "extraction.brands",
            run_id = self.run_id,
            raw = raw.len(),
            canonical = dedup.brands.len()
        );

        let items: Vec<(String, String)> = usable
            .iter()
            .map(|r| (r.response_key(), r.response.clone()))
            .collect();
        let ranked = extract_ranked_lists(llm, &items, category, &dedup.brands, &dedup.alias_map).await;
        let canon = Canonicalizer::new(&dedup.brands, &dedup.alias_map);
        let claims = extract_claims(llm, &responses, category, category, Some(&canon)).await;
        info!(
            target: "geoprobe.leaderboard",
            stage = "extraction.details",
            run_id = self.run_id,
            ranked_responses = ranked.values().filter(|v| !v.is_empty()).count(),
            claims = claims.len()
        );

        let files_by_brand = dedup
            .brands
            .iter()
            .cloned()
            .zip(layout::brand_analysis_files(&dedup.brands))
            .collect();
        let checkpoint = ExtractionCheckpoint {
            brands: dedup.brands,
            alias_map: dedup.alias_map,
            extracted_claims: claims,
            ranked_lists_by_response: ranked,
            analysis_files: files_by_brand,
        };
        storage
            .save(self.run_id, layout::EXTRACTION_CHECKPOINT, &checkpoint)
            .await?;
        self.end(phase, started);
        Ok(checkpoint)
    }

    /// Returns one entry per brand, in brand order. Brands with a saved
    /// analysis are loaded; the rest are analysed concurrently and each is
    /// saved as soon as it finishes. Every task is drained before the first
    /// failure is returned.
    async fn analysis(
        &self,
        profile: &BrandProfile,
        execution: &ExecutionRun,
        checkpoint: ExtractionCheckpoint,
    ) -> Result<Vec<LeaderboardEntry>, GeoError> {
        let phase = LeaderboardPhase::Analysis;
        let storage = &self.services.storage;

        let files = analysis_files(&checkpoint);
        let mut slots: Vec<Option<LeaderboardEntry>> = vec![None; checkpoint.brands.len()];
        let mut pending = Vec::new();
        for (idx, brand) in checkpoint.brands.iter().enumerate() {
            match storage.load::<AnalysisResult>(self.run_id, &files[idx]).await? {
                Some(cached) if cached.brand == *brand => {
                    slots[idx] = Some(LeaderboardEntry::from_analysis(brand, &cached))
                }
                Some(cached) => {
                    warn!(
                        target: "geoprobe.leaderboard",
                        stage = "analysis.checkpoint_mismatch",
                        run_id = self.run_id,
                        brand = %brand,
                        found = %cached.brand,
                        file = %files[idx]
                    );
                    pending.push(idx);
                }
                None => pending.push(idx),
            }
        }
        if pending.is_empty() {
            self.skip(phase, "every brand already analyzed");
            return Ok(slots.into_iter().flatten().collect());
        }

        let started = self.begin(phase);
        let workers = self.args.cfg.execution.concurrency.clamp(1, MAX_ANALYSIS_WORKERS);
        info!(
            target: "geoprobe.leaderboard",
            stage = "analysis.plan",
            run_id = self.run_id,
            brands = checkpoint.brands.len(),
            cached = checkpoint.brands.len() - pending.len(),
            pending = pending.len(),
            workers
        );

        let shared = Arc::new(SharedInputs {
            run_id: self.run_id.to_string(),
            base: profile.clone(),
            results: execution.results.clone(),
            checkpoint,
            files,
            kinds: self.args.cfg.analysis.analyzers.clone(),
        });

        let outcomes = run_bounded(pending, workers, |idx| {
            let shared = shared.clone();
            async move { self.analyze_one(shared, idx).await.map(|entry| (idx, entry)) }
        })
        .await?;

        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok((idx, entry)) => slots[idx] = Some(entry),
                Err(err) => {
                    warn!(target: "geoprobe.leaderboard", stage = "analysis.brand_failed", run_id = self.run_id, error = %err);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        self.end(phase, started);
        Ok(slots.into_iter().flatten().collect())
    }

    async fn analyze_one(&self, shared: Arc<SharedInputs>, idx: usize) -> Result<LeaderboardEntry, GeoError> {
        let brand = shared.checkpoint.brands[idx].clone();
        let file = shared.files[idx].clone();
        let analysis = {
            let brand = brand.clone();
            tokio::task::spawn_blocking(move || analyze_for(&shared, &brand))
                .await
                .map_err(|e| {
                    GeoError::pipeline(
                        LeaderboardPhase::Analysis.as_str(),
                        format!("analysis task failed: {e}"),
                    )
                })?
        };

        self.services
            .storage
            .save(self.run_id, &file, &analysis)
            .await?;
        info!(
            target: "geoprobe.leaderboard",
            stage = "analysis.brand_done",
            run_id = self.run_id,
            brand = %brand,
            overall_score = analysis.summary.overall_score
        );
        emit(
            &self.services.renderer,
            RenderEvent::BrandAnalyzed {
                run_id: self.run_id.to_string(),
                brand: brand.clone(),
                overall_score: analysis.summary.overall_score,
            },
        );
        Ok(LeaderboardEntry::from_analysis(&brand, &analysis))
    }

    async fn ranking(
        &self,
        mut entries: Vec<LeaderboardEntry>,
        brands: Vec<String>,
        total_queries: usize,
        providers_used: Vec<String>,
    ) -> Result<LeaderboardResult, GeoError> {
        let phase = LeaderboardPhase::Ranking;
        let started = self.begin(phase);
        rank_entries(&mut entries);

        let result = LeaderboardResult {
            run_id: self.run_id.to_string(),
            category: self.args.category.clone(),
            brands,
            entries,
            total_queries,
            providers_used,
            analyzed_at: chrono::Utc::now().to_rfc3339(),
            stopped_after: None,
        };

        let storage = &self.services.storage;
        storage.save(self.run_id, layout::LEADERBOARD, &result).await?;
        for format in &self.args.cfg.report.formats {
            match format {
                ReportFormat::Json => {
                    storage
                        .save(self.run_id, layout::LEADERBOARD_REPORT_JSON, &result)
                        .await?
                }
                ReportFormat::Markdown => {
                    storage
                        .save_text(
                            self.run_id,
                            layout::LEADERBOARD_REPORT_MD,
                            &render_leaderboard_markdown(&result),
                        )
                        .await?
                }
            }
        }
        self.end(phase, started);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(brand: &str, score: f64) -> LeaderboardEntry {
        let mut analysis = AnalysisResult::default();
        analysis.summary.overall_score = score;
        LeaderboardEntry::from_analysis(brand, &analysis)
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let mut entries = vec![entry("A", 40.0), entry("B", 70.0), entry("C", 40.0), entry("D", 90.0)];
        rank_entries(&mut entries);
        let order: Vec<(&str, usize)> = entries.iter().map(|e| (e.brand.as_str(), e.rank)).collect();
        assert_eq!(order, vec![("D", 1), ("B", 2), ("A", 3), ("C", 4)]);
    }

    #[test]
    fn per_brand_profile_excludes_self_from_competitors() {
        let shared = SharedInputs {
            run_id: "lb-1".into(),
            base: BrandProfile {
                category: "CRM tools".into(),
                ..Default::default()
            },
            results: vec![crate::analysis::fixtures::result(
                "openai",
                "q1",
                "Acme is great. Beta is fine. Acme again.",
            )],
            checkpoint: ExtractionCheckpoint {
                brands: vec!["Acme".into(), "Beta".into()],
                ..Default::default()
            },
            files: vec!["analysis/acme.json".into(), "analysis/beta.json".into()],
            kinds: vec![AnalyzerKind::Mindshare, AnalyzerKind::MentionRate],
        };
        let analysis = analyze_for(&shared, "Acme");
        assert_eq!(analysis.brand, "Acme");
        assert_eq!(analysis.mindshare.total_brands_detected, 2);
        assert!(analysis.mindshare.overall > 0.6);
        assert_eq!(analysis.mention_rate.total_mentions, 1);
        assert_eq!(analysis.mention_rate.overall, 1.0);
    }

    #[test]
    fn recorded_files_are_used_unless_incomplete_or_shared() {
        let brands: Vec<String> = vec!["C++ Tools".into(), "C Tools".into()];
        let mut checkpoint = ExtractionCheckpoint {
            brands: brands.clone(),
            ..Default::default()
        };
        assert_eq!(
            analysis_files(&checkpoint),
            vec!["analysis/c-tools.json", "analysis/c-tools-2.json"]
        );

        checkpoint.analysis_files = brands
            .iter()
            .cloned()
            .zip(["analysis/x.json".to_string(), "analysis/y.json".to_string()])
            .collect();
        assert_eq!(analysis_files(&checkpoint), vec!["analysis/x.json", "analysis/y.json"]);

        checkpoint.analysis_files.insert("C Tools".into(), "analysis/x.json".into());
        assert_eq!(
            analysis_files(&checkpoint),
            vec!["analysis/c-tools.json", "analysis/c-tools-2.json"]
        );
    }
}
