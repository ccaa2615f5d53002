use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "geoprobe", version, about = "Measure how AI assistants talk about brands")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Explicit config file; defaults to ~/.geoprobe/config.toml or ./geoprobe.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Root directory for run artifacts.
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// Run event output: text, jsonl or none.
    #[arg(long, default_value = "text", global = true)]
    pub output: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Flags shared by every command that fans queries out to providers.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ExecutionFlags {
    /// Comma-separated provider names to query; others are disabled.
    #[arg(long, value_delimiter = ',')]
    pub providers: Vec<String>,

    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub iterations: Option<u32>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(long)]
    pub retries: Option<u32>,

    /// Number of queries to generate.
    #[arg(long)]
    pub queries: Option<usize>,

    /// Continue an existing run from its checkpoints.
    #[arg(long)]
    pub resume: Option<String>,

    /// Stop after the named stage or phase.
    #[arg(long)]
    pub stop_after: Option<String>,

    /// Show a progress bar during execution.
    #[arg(long)]
    pub progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Brand to study. Falls back to `brand` in config; ignored with --resume.
    pub brand: Option<String>,

    /// Comma-separated competitors, replacing those from config.
    #[arg(long, value_delimiter = ',')]
    pub competitors: Vec<String>,

    /// Skip the interactive review after research and query generation.
    #[arg(short = 'y', long)]
    pub yes: bool,

    #[command(flatten)]
    pub exec: ExecutionFlags,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LeaderboardArgs {
    /// Category to rank, e.g. "CRM software".
    pub category: String,

    /// Upper bound on brands carried into analysis.
    #[arg(long)]
    pub max_brands: Option<usize>,

    #[command(flatten)]
    pub exec: ExecutionFlags,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunsArgs {
    /// Show metadata for one run instead of listing.
    pub run_id: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct HealthArgs {
    /// Comma-separated provider names; defaults to every enabled provider.
    #[arg(long, value_delimiter = ',')]
    pub providers: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Single-brand visibility run.
    Run(RunArgs),
    /// Category-wide brand ranking.
    Leaderboard(LeaderboardArgs),
    /// List past runs.
    Runs(RunsArgs),
    /// Health-check every configured provider.
    Health(HealthArgs),
}
