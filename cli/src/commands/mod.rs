pub mod cli;
pub mod health;
pub mod leaderboard;
pub mod run;
pub mod runs;

use geoprobe_core::api::{AppConfig, GeoError, Services, ServicesFactory};
use geoprobe_plugins::services::PluginServicesFactory;

use crate::error::CliError;
use cli::{Args, Commands, ExecutionFlags};

pub async fn dispatch(args: Args, cfg: AppConfig) -> Result<i32, CliError> {
    let output = args.output.clone();
    match args.command {
        Commands::Run(run_args) => run::run(run_args, cfg, &output).await,
        Commands::Leaderboard(lb_args) => leaderboard::run(lb_args, cfg, &output).await,
        Commands::Runs(runs_args) => runs::run(runs_args, &cfg).await,
        Commands::Health(health_args) => health::run(health_args, cfg).await,
    }
}

/// CLI flags sit above every other config source.
pub fn apply_execution_flags(cfg: &mut AppConfig, flags: &ExecutionFlags) -> Result<(), GeoError> {
    if !flags.providers.is_empty() {
        cfg.restrict_providers(&flags.providers)?;
    }
    if let Some(n) = flags.concurrency {
        cfg.execution.concurrency = n;
    }
    if let Some(n) = flags.iterations {
        cfg.execution.iterations = n;
    }
    if let Some(ms) = flags.timeout_ms {
        cfg.execution.timeout_ms = ms;
    }
    if let Some(n) = flags.retries {
        cfg.execution.retries = n;
    }
    if let Some(n) = flags.queries {
        cfg.queries.count = n;
    }
    Ok(())
}

/// Validates before any service or run directory exists.
pub async fn build_services(cfg: &AppConfig, output: &str) -> Result<Services, GeoError> {
    cfg.validate()?;
    PluginServicesFactory::new(output).build_services(cfg).await
}
