//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `geoprobe_core::api` instead of reaching into internal modules.

pub use crate::analysis::AnalyzerKind;
pub use crate::config::{
    apply_env_overrides, default_config_path, get_geoprobe_data_dir, load_default, load_from_path,
    AppConfig, ExecutionConfig, LoggingConfig, ProcessingConfig, ProviderConfig, ReportFormat,
};
pub use crate::context::{new_run_id, RunContext, RunStatus, Services, ServicesFactory};
pub use crate::engine::{GeoEngine, GeoRunArgs, GeoRunOutcome};
pub use crate::error::{GeoError, ProviderError, StorageError};
pub use crate::executor::{
    ExecutionEngine, ExecutionOpts, OutputRendererPlugin, RenderEvent, RetryStrategyPlugin,
};
pub use crate::leaderboard::{LeaderboardArgs, LeaderboardOrchestrator, LeaderboardPhase, DEFAULT_MAX_BRANDS};
pub use crate::pipeline::{Pipeline, PipelineHook, PipelineOutcome, PipelineStage};
pub use crate::provider::{HealthStatus, Provider, ProviderRegistry, ProviderResponse};
pub use crate::stages::STAGE_NAMES;
pub use crate::storage::{layout, FileSystemStorage, Storage, StorageExt};
pub use crate::types::{
    BrandProfile, ExecutionRun, LeaderboardEntry, LeaderboardResult, QueryResult, QuerySet,
    RunMetadata, TokenUsage,
};
