//! Persisted data model.
//!
//! Every struct here round-trips through JSON checkpoints, so fields added
//! later must carry `#[serde(default)]` to keep older runs resumable.

pub mod analysis;
pub mod brand;
pub mod leaderboard;
pub mod metadata;
pub mod query;
pub mod result;

pub use analysis::*;
pub use brand::BrandProfile;
pub use leaderboard::{ExtractionCheckpoint, LeaderboardEntry, LeaderboardResult};
pub use metadata::RunMetadata;
pub use query::{GeneratedQuery, QueryCategory, QuerySet, QueryStrategy};
pub use result::{ExecutionRun, ExecutionStatus, QueryResult, TokenUsage};

/// Bump when a persisted artifact contract changes.
pub const SCHEMA_VERSION: &str = "1.0.0";
