use std::sync::Arc;

use geoprobe_core::api::{AppConfig, GeoEngine, GeoError, GeoRunArgs, PipelineHook, PipelineOutcome};
use geoprobe_core::stages::{QUERY_GENERATION, RESEARCH};

use super::cli::RunArgs;
use super::{apply_execution_flags, build_services};
use crate::error::CliError;
use crate::hooks::ReviewHook;

pub async fn run(args: RunArgs, mut cfg: AppConfig, output: &str) -> Result<i32, CliError> {
    apply_execution_flags(&mut cfg, &args.exec)?;
    if !args.competitors.is_empty() {
        cfg.competitors = args.competitors.clone();
    }

    // On resume the brand comes from the run's metadata.
    let brand = match (args.brand.clone().or_else(|| cfg.brand.clone()), &args.exec.resume) {
        (Some(b), _) => b,
        (None, Some(_)) => String::new(),
        (None, None) => {
            return Err(GeoError::Config(
                "no brand given: pass one on the command line or set `brand` in config".into(),
            )
            .into())
        }
    };

    let services = build_services(&cfg, output).await?;
    let interactive = !args.yes && output == "text" && atty::is(atty::Stream::Stdin);

    let mut run_args = GeoRunArgs::new(brand, cfg);
    run_args.resume_run_id = args.exec.resume.clone();
    run_args.stop_after = args.exec.stop_after.clone();
    run_args.show_progress = args.exec.progress;
    if interactive {
        let hook: Arc<dyn PipelineHook> = Arc::new(ReviewHook::stdin(services.storage.clone()));
        run_args.hooks = vec![
            (RESEARCH.to_string(), hook.clone()),
            (QUERY_GENERATION.to_string(), hook),
        ];
    }

    let outcome = GeoEngine::new(services.clone()).run(run_args).await?;
    let ctx = &outcome.context;
    let run_dir = services.storage.run_dir(ctx.run_id());

    println!("run:    {}", ctx.run_id());
    println!("brand:  {}", ctx.brand);
    match &outcome.outcome {
        PipelineOutcome::Completed => println!("status: completed"),
        PipelineOutcome::Stopped { after } => println!("status: stopped after {after}"),
    }
    if let Some(analysis) = &ctx.analysis_result {
        println!("score:  {:.1}/100", analysis.summary.overall_score);
        println!("        {}", analysis.summary.headline);
    }
    println!("output: {}", run_dir.display());
    Ok(0)
}
