use thiserror::Error;

use super::provider::ProviderError;
use super::storage::StorageError;

/// Run-level errors. Anything surfacing as a `GeoError` aborts the run.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("config error: {0}")]
    Config(String),

    #[error("[{stage}] {message}")]
    Pipeline { stage: String, message: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("aborted: {0}")]
    Aborted(String),
}

impl GeoError {
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Pipeline { .. } => "PIPELINE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Provider(e) => e.code(),
            Self::RunNotFound(_) => "RUN_NOT_FOUND",
            Self::Aborted(_) => "ABORTED",
        }
    }
}
