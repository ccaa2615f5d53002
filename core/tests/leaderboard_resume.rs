mod common;

use std::sync::Arc;

use common::{services, FailingSaves, FakeProvider, ScriptedProcessing};
use geoprobe_core::api::{
    layout, AppConfig, GeoError, LeaderboardArgs, LeaderboardOrchestrator, Provider, RunMetadata,
    Storage, StorageExt,
};
use geoprobe_core::leaderboard::CATEGORY_PROMPT_MARKER;
use geoprobe_core::types::{AnalysisResult, ExtractionCheckpoint, LeaderboardResult};
use pretty_assertions::assert_eq;

fn processing() -> Arc<ScriptedProcessing> {
    Arc::new(
        ScriptedProcessing::new()
            .reply(
                CATEGORY_PROMPT_MARKER,
                r#"{"category": "CRM software", "industry": "software", "keywords": ["crm", "sales pipeline"]}"#,
            )
            .reply(
                "<query text> | <category> | <intent>",
                "best crm for small teams | recommendation | discovery\nwhich crm has the best pricing | comparison | evaluation",
            )
            .reply("JSON array of brand names", r#"["Acme", "Globex"]"#)
            .reply("JSON object mapping each alias", "{}")
            .reply("exact order the response explicitly ranks", "{}")
            .reply(
                "JSON array of claims",
                r#"[{"brand": "acme", "attribute": "pricing", "sentiment": "positive", "claim": "Acme is affordable"}]"#,
            ),
    )
}

fn args(cfg: &AppConfig) -> LeaderboardArgs {
    let mut args = LeaderboardArgs::new("CRM software", cfg.clone());
    args.cfg.queries.count = 4;
    args.cfg.execution.concurrency = 4;
    args
}

#[tokio::test]
async fn full_run_ranks_brands_and_resume_makes_no_provider_calls() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::default();

    let first = Arc::new(FakeProvider::new("openai"));
    let proc1 = processing();
    let svc = services(dir.path(), proc1.clone(), vec![first.clone() as Arc<dyn Provider>]);
    let result = LeaderboardOrchestrator::new(svc.clone()).run(args(&cfg)).await.unwrap();

    assert_eq!(result.stopped_after, None);
    assert_eq!(result.brands, vec!["Acme".to_string(), "Globex".to_string()]);
    assert_eq!(
        result.entries.iter().map(|e| (e.rank, e.brand.as_str())).collect::<Vec<_>>(),
        vec![(1, "Acme"), (2, "Globex")]
    );
    assert_eq!(first.call_count(), result.total_queries);
    assert!(result.total_queries > 0);

    let saved: LeaderboardResult = svc
        .storage
        .load(&result.run_id, layout::LEADERBOARD)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.entries.len(), 2);
    let run_dir = svc.storage.run_dir(&result.run_id);
    assert!(run_dir.join("analysis/acme.json").exists());
    assert!(run_dir.join(layout::LEADERBOARD_REPORT_MD).exists());

    let second = Arc::new(FakeProvider::new("openai"));
    let proc2 = processing();
    let svc2 = services(dir.path(), proc2.clone(), vec![second.clone() as Arc<dyn Provider>]);
    let mut resume = args(&cfg);
    resume.resume_run_id = Some(result.run_id.clone());
    let resumed = LeaderboardOrchestrator::new(svc2).run(resume).await.unwrap();

    assert_eq!(second.call_count(), 0);
    assert_eq!(proc2.call_count(), 0);
    assert_eq!(resumed.run_id, result.run_id);
    assert_eq!(resumed.entries.len(), 2);
    assert_eq!(resumed.entries[0].brand, "Acme");
}

#[tokio::test]
async fn stop_after_extraction_then_resume_skips_execution() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::default();

    let provider = Arc::new(FakeProvider::new("openai"));
    let svc = services(dir.path(), processing(), vec![provider.clone() as Arc<dyn Provider>]);
    let mut stop = args(&cfg);
    stop.stop_after = Some("extraction".into());
    let stopped = LeaderboardOrchestrator::new(svc.clone()).run(stop).await.unwrap();

    assert_eq!(stopped.stopped_after.as_deref(), Some("extraction"));
    assert!(stopped.entries.is_empty());
    assert_eq!(stopped.brands.len(), 2);
    let meta: RunMetadata = svc
        .storage
        .load(&stopped.run_id, layout::METADATA)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(meta.status, "stopped-after-extraction");
    assert_eq!(meta.kind, "leaderboard");
    let run_dir = svc.storage.run_dir(&stopped.run_id);
    assert!(run_dir.join(layout::EXTRACTION_CHECKPOINT).exists());
    assert!(!run_dir.join(layout::LEADERBOARD).exists());

    let fresh = Arc::new(FakeProvider::new("openai"));
    let proc2 = processing();
    let svc2 = services(dir.path(), proc2.clone(), vec![fresh.clone() as Arc<dyn Provider>]);
    let mut resume = args(&cfg);
    resume.resume_run_id = Some(stopped.run_id.clone());
    let done = LeaderboardOrchestrator::new(svc2).run(resume).await.unwrap();

    assert_eq!(fresh.call_count(), 0);
    assert_eq!(proc2.calls_matching("JSON array of brand names"), 0);
    assert_eq!(done.entries.len(), 2);
    assert!(run_dir.join(layout::LEADERBOARD).exists());
}

#[tokio::test]
async fn resuming_a_missing_run_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new("openai"));
    let proc = processing();
    let svc = services(dir.path(), proc.clone(), vec![provider.clone() as Arc<dyn Provider>]);

    let mut resume = args(&AppConfig::default());
    resume.resume_run_id = Some("lb-20250101-000000-abcdef".into());
    let err = LeaderboardOrchestrator::new(svc).run(resume).await.unwrap_err();

    assert!(matches!(err, GeoError::RunNotFound(_)));
    assert_eq!(provider.call_count(), 0);
    assert_eq!(proc.call_count(), 0);
}

#[tokio::test]
async fn unknown_stop_after_is_rejected_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let svc = services(dir.path(), processing(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);

    let mut bad = args(&AppConfig::default());
    bad.stop_after = Some("ranking-ish".into());
    let err = LeaderboardOrchestrator::new(svc.clone()).run(bad).await.unwrap_err();

    assert!(matches!(err, GeoError::Config(_)));
    assert!(svc.storage.list_runs().await.unwrap().is_empty());
}

#[tokio::test]
async fn all_failed_responses_abort_after_execution() {
    let dir = tempfile::tempdir().unwrap();
    let broken = Arc::new(FakeProvider::new("openai").reject_on(""));
    let svc = services(dir.path(), processing(), vec![broken as Arc<dyn Provider>]);

    let err = LeaderboardOrchestrator::new(svc.clone())
        .run(args(&AppConfig::default()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No valid responses received from any provider"));

    let runs = svc.storage.list_runs().await.unwrap();
    assert_eq!(runs.len(), 1);
    let meta: RunMetadata = svc.storage.load(&runs[0], layout::METADATA).await.unwrap().unwrap();
    assert_eq!(meta.status, "failed");
    assert!(!meta.errors.is_empty());
}

fn scores(result: &LeaderboardResult) -> Vec<(String, f64)> {
    result
        .entries
        .iter()
        .map(|e| (e.brand.clone(), e.overall_score))
        .collect()
}

#[tokio::test]
async fn brands_with_colliding_slugs_keep_separate_analyses() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::default();
    let processing = || {
        Arc::new(
            ScriptedProcessing::new()
                .reply(CATEGORY_PROMPT_MARKER, r#"{"category": "dev tools", "industry": "software"}"#)
                .reply(
                    "<query text> | <category> | <intent>",
                    "best tools for native developers | recommendation | discovery",
                )
                .reply("JSON array of brand names", r#"["C++ Tools", "C Tools"]"#)
                .reply("JSON object mapping each alias", "{}")
                .reply("exact order the response explicitly ranks", "{}")
                .reply("JSON array of claims", "[]"),
        )
    };
    let provider = || {
        Arc::new(FakeProvider::new("openai").reply(
            "C++ Tools is the top pick. C++ Tools wins on features. C Tools is an option.",
        )) as Arc<dyn Provider>
    };

    let svc = services(dir.path(), processing(), vec![provider()]);
    let first = LeaderboardOrchestrator::new(svc.clone()).run(args(&cfg)).await.unwrap();
    let first_scores = scores(&first);
    assert_eq!(first_scores.len(), 2);
    assert_ne!(first_scores[0].1, first_scores[1].1);

    let checkpoint: ExtractionCheckpoint = svc
        .storage
        .load(&first.run_id, layout::EXTRACTION_CHECKPOINT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.analysis_files["C++ Tools"], "analysis/c-tools.json");
    assert_eq!(checkpoint.analysis_files["C Tools"], "analysis/c-tools-2.json");
    for (brand, file) in &checkpoint.analysis_files {
        let saved: AnalysisResult = svc.storage.load(&first.run_id, file).await.unwrap().unwrap();
        assert_eq!(&saved.brand, brand);
    }

    let proc2 = processing();
    let svc2 = services(dir.path(), proc2.clone(), vec![provider()]);
    let mut resume = args(&cfg);
    resume.resume_run_id = Some(first.run_id.clone());
    let resumed = LeaderboardOrchestrator::new(svc2).run(resume).await.unwrap();

    assert_eq!(proc2.call_count(), 0);
    assert_eq!(scores(&resumed), first_scores);
}

#[tokio::test]
async fn cached_analysis_for_another_brand_is_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::default();
    let svc = services(dir.path(), processing(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);
    let first = LeaderboardOrchestrator::new(svc.clone()).run(args(&cfg)).await.unwrap();
    let first_scores = scores(&first);

    let run_dir = svc.storage.run_dir(&first.run_id);
    std::fs::copy(run_dir.join("analysis/acme.json"), run_dir.join("analysis/globex.json")).unwrap();

    let svc2 = services(dir.path(), processing(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);
    let mut resume = args(&cfg);
    resume.resume_run_id = Some(first.run_id.clone());
    let resumed = LeaderboardOrchestrator::new(svc2).run(resume).await.unwrap();

    assert_eq!(scores(&resumed), first_scores);
    let globex: AnalysisResult = svc
        .storage
        .load(&first.run_id, "analysis/globex.json")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(globex.brand, "Globex");
}

#[tokio::test]
async fn resume_reanalyzes_only_brands_without_a_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::default();
    let svc = services(dir.path(), processing(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);
    let first = LeaderboardOrchestrator::new(svc.clone()).run(args(&cfg)).await.unwrap();

    let run_dir = svc.storage.run_dir(&first.run_id);
    let acme_path = run_dir.join("analysis/acme.json");
    let globex_path = run_dir.join("analysis/globex.json");
    let acme_before = std::fs::read(&acme_path).unwrap();
    let acme_mtime = std::fs::metadata(&acme_path).unwrap().modified().unwrap();
    std::fs::remove_file(&globex_path).unwrap();

    let provider = Arc::new(FakeProvider::new("openai"));
    let proc2 = processing();
    let svc2 = services(dir.path(), proc2.clone(), vec![provider.clone() as Arc<dyn Provider>]);
    let mut resume = args(&cfg);
    resume.resume_run_id = Some(first.run_id.clone());
    let resumed = LeaderboardOrchestrator::new(svc2).run(resume).await.unwrap();

    assert_eq!(provider.call_count(), 0);
    assert_eq!(proc2.call_count(), 0);
    assert!(globex_path.exists());
    assert_eq!(std::fs::read(&acme_path).unwrap(), acme_before);
    assert_eq!(std::fs::metadata(&acme_path).unwrap().modified().unwrap(), acme_mtime);
    assert_eq!(scores(&resumed), scores(&first));
}

#[tokio::test]
async fn failed_brand_analysis_drains_siblings_then_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::default();
    let mut svc = services(dir.path(), processing(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);
    svc.storage = Arc::new(FailingSaves::new(dir.path(), "analysis/globex.json")) as Arc<dyn Storage>;

    let err = LeaderboardOrchestrator::new(svc.clone()).run(args(&cfg)).await.unwrap_err();
    assert!(matches!(err, GeoError::Storage(_)));

    let runs = svc.storage.list_runs().await.unwrap();
    assert_eq!(runs.len(), 1);
    let run_dir = svc.storage.run_dir(&runs[0]);
    assert!(run_dir.join("analysis/acme.json").exists());
    assert!(!run_dir.join("analysis/globex.json").exists());
    assert!(!run_dir.join(layout::LEADERBOARD).exists());
    let meta: RunMetadata = svc.storage.load(&runs[0], layout::METADATA).await.unwrap().unwrap();
    assert_eq!(meta.status, "failed");

    let svc2 = services(dir.path(), processing(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);
    let mut resume = args(&cfg);
    resume.resume_run_id = Some(runs[0].clone());
    let done = LeaderboardOrchestrator::new(svc2).run(resume).await.unwrap();
    assert_eq!(done.entries.len(), 2);
    assert!(run_dir.join("analysis/globex.json").exists());
}

#[tokio::test]
async fn resume_id_outside_the_output_dir_is_not_found() {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().join("out");
    std::fs::create_dir_all(parent.path().join("lb-elsewhere")).unwrap();
    let proc = processing();
    let svc = services(&root, proc.clone(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);

    let mut resume = args(&AppConfig::default());
    resume.resume_run_id = Some("../lb-elsewhere".into());
    let err = LeaderboardOrchestrator::new(svc).run(resume).await.unwrap_err();

    assert!(matches!(err, GeoError::RunNotFound(_)));
    assert_eq!(proc.call_count(), 0);
    assert!(!parent.path().join("lb-elsewhere/metadata.json").exists());
}
