mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{services, FakeProvider, ScriptedProcessing};
use geoprobe_core::api::{
    layout, AppConfig, GeoEngine, GeoError, GeoRunArgs, PipelineHook, PipelineOutcome, Provider,
    RunContext, RunMetadata, StorageExt,
};
use geoprobe_core::stages::{QUERY_GENERATION, RESEARCH_PROMPT_MARKER};
use geoprobe_core::types::{AnalysisResult, QueryStrategy};
use pretty_assertions::assert_eq;

fn processing() -> Arc<ScriptedProcessing> {
    Arc::new(
        ScriptedProcessing::new()
            .reply(
                RESEARCH_PROMPT_MARKER,
                r#"{"description": "Sales CRM", "industry": "software", "category": "CRM software",
                    "competitors": ["Globex"], "keywords": ["crm"]}"#,
            )
            .reply(
                "<query text> | <category> | <intent>",
                "best crm for small teams | recommendation | discovery\ncrm with the cheapest plans | comparison | pricing",
            )
            .reply("Extract all company, brand, and product names", r#"["Globex", "Initech"]"#)
            .reply("exact order the response explicitly ranks", "{}")
            .reply("JSON array of claims", "[]"),
    )
}

fn cfg() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.queries.count = 2;
    cfg.queries.strategies = vec![QueryStrategy::Keyword];
    cfg.execution.concurrency = 2;
    cfg
}

#[tokio::test]
async fn completed_run_persists_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new("openai"));
    let svc = services(dir.path(), processing(), vec![provider.clone() as Arc<dyn Provider>]);

    let outcome = GeoEngine::new(svc.clone())
        .run(GeoRunArgs::new("Acme", cfg()))
        .await
        .unwrap();

    assert_eq!(outcome.outcome, PipelineOutcome::Completed);
    assert_eq!(provider.call_count(), 2);
    let ctx = &outcome.context;
    assert_eq!(ctx.competitors(), vec!["Globex".to_string()]);

    let run_dir = svc.storage.run_dir(outcome.run_id());
    for rel in [
        layout::BRAND_PROFILE,
        layout::QUERIES,
        layout::RESULTS,
        layout::ANALYSIS,
        layout::SNAPSHOT,
        layout::REPORT_JSON,
        layout::REPORT_MD,
    ] {
        assert!(run_dir.join(rel).exists(), "missing {rel}");
    }

    let analysis: AnalysisResult = svc
        .storage
        .load(outcome.run_id(), layout::ANALYSIS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(analysis.brand, "Acme");
    assert_eq!(analysis.mention_rate.overall, 1.0);

    let meta: RunMetadata = svc
        .storage
        .load(outcome.run_id(), layout::METADATA)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(meta.status, "completed");
    assert!(meta.completed_at.is_some());
}

#[tokio::test]
async fn stop_then_resume_reuses_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let proc1 = processing();
    let provider = Arc::new(FakeProvider::new("openai"));
    let svc = services(dir.path(), proc1.clone(), vec![provider.clone() as Arc<dyn Provider>]);

    let mut args = GeoRunArgs::new("Acme", cfg());
    args.stop_after = Some(QUERY_GENERATION.to_string());
    let stopped = GeoEngine::new(svc.clone()).run(args).await.unwrap();

    assert_eq!(
        stopped.outcome,
        PipelineOutcome::Stopped {
            after: QUERY_GENERATION.to_string()
        }
    );
    assert_eq!(provider.call_count(), 0);
    let run_id = stopped.run_id().to_string();
    let meta: RunMetadata = svc.storage.load(&run_id, layout::METADATA).await.unwrap().unwrap();
    assert_eq!(meta.status, "stopped-after-query-generation");

    let proc2 = processing();
    let svc2 = services(dir.path(), proc2.clone(), vec![provider.clone() as Arc<dyn Provider>]);
    let mut resume = GeoRunArgs::new("", cfg());
    resume.resume_run_id = Some(run_id.clone());
    let done = GeoEngine::new(svc2).run(resume).await.unwrap();

    assert_eq!(done.outcome, PipelineOutcome::Completed);
    assert_eq!(done.context.brand, "Acme");
    assert_eq!(proc2.calls_matching(RESEARCH_PROMPT_MARKER), 0);
    assert_eq!(proc2.calls_matching("<query text> | <category> | <intent>"), 0);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn unknown_stop_after_fails_before_creating_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let svc = services(dir.path(), processing(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);

    let mut args = GeoRunArgs::new("Acme", cfg());
    args.stop_after = Some("extraction".into());
    let err = GeoEngine::new(svc.clone()).run(args).await.err().unwrap();

    assert!(matches!(err, GeoError::Config(_)));
    assert!(svc.storage.list_runs().await.unwrap().is_empty());
}

#[tokio::test]
async fn resuming_a_missing_run_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let proc = processing();
    let svc = services(dir.path(), proc.clone(), vec![Arc::new(FakeProvider::new("openai")) as Arc<dyn Provider>]);

    let mut args = GeoRunArgs::new("Acme", cfg());
    args.resume_run_id = Some("run-20250101-000000-abcdef".into());
    let err = GeoEngine::new(svc).run(args).await.err().unwrap();

    assert!(matches!(err, GeoError::RunNotFound(_)));
    assert_eq!(proc.call_count(), 0);
}

struct AbortAfter;

#[async_trait]
impl PipelineHook for AbortAfter {
    async fn after_stage(&self, stage: &str, _ctx: &mut RunContext) -> Result<(), GeoError> {
        Err(GeoError::Aborted(format!("operator stopped after {stage}")))
    }
}

#[tokio::test]
async fn hook_abort_fails_the_run_and_records_the_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FakeProvider::new("openai"));
    let svc = services(dir.path(), processing(), vec![provider.clone() as Arc<dyn Provider>]);

    let mut args = GeoRunArgs::new("Acme", cfg());
    args.hooks = vec![("research".to_string(), Arc::new(AbortAfter) as Arc<dyn PipelineHook>)];
    let err = GeoEngine::new(svc.clone()).run(args).await.err().unwrap();

    assert!(matches!(err, GeoError::Aborted(_)));
    assert_eq!(provider.call_count(), 0);
    let runs = svc.storage.list_runs().await.unwrap();
    let meta: RunMetadata = svc.storage.load(&runs[0], layout::METADATA).await.unwrap().unwrap();
    assert_eq!(meta.status, "failed");
    assert_eq!(meta.errors.len(), 1);
    assert!(meta.errors[0].starts_with("[research]"));
}
