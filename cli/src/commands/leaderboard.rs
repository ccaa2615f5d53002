use geoprobe_core::api::{AppConfig, LeaderboardArgs as CoreArgs, LeaderboardOrchestrator};

use super::cli::LeaderboardArgs;
use super::{apply_execution_flags, build_services};
use crate::error::CliError;

const TOP_ROWS: usize = 15;

pub async fn run(args: LeaderboardArgs, mut cfg: AppConfig, output: &str) -> Result<i32, CliError> {
    apply_execution_flags(&mut cfg, &args.exec)?;
    let services = build_services(&cfg, output).await?;

    let mut core_args = CoreArgs::new(args.category.clone(), cfg);
    if let Some(n) = args.max_brands {
        core_args.max_brands = n;
    }
    core_args.resume_run_id = args.exec.resume.clone();
    core_args.stop_after = args.exec.stop_after.clone();
    core_args.show_progress = args.exec.progress;

    let result = LeaderboardOrchestrator::new(services.clone()).run(core_args).await?;
    let run_dir = services.storage.run_dir(&result.run_id);

    println!("run:      {}", result.run_id);
    println!("category: {}", result.category);
    if let Some(after) = &result.stopped_after {
        println!("status:   stopped after {after}");
        println!("output:   {}", run_dir.display());
        return Ok(0);
    }

    println!(
        "{} brands over {} queries from {}",
        result.brands.len(),
        result.total_queries,
        result.providers_used.join(", ")
    );
    println!();
    println!("{:>3}  {:<28} {:>6} {:>8} {:>9}", "#", "brand", "score", "mention", "mindshare");
    for entry in result.entries.iter().take(TOP_ROWS) {
        println!(
            "{:>3}  {:<28} {:>6.1} {:>7.0}% {:>8.0}%",
            entry.rank,
            entry.brand,
            entry.overall_score,
            entry.mention_rate * 100.0,
            entry.mindshare * 100.0
        );
    }
    if result.entries.len() > TOP_ROWS {
        println!("     ... {} more", result.entries.len() - TOP_ROWS);
    }
    println!();
    println!("output:   {}", run_dir.display());
    Ok(0)
}
