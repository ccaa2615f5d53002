use geoprobe_core::api::GeoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    // 0: success
    // 11: config error
    // 12: run not found
    // 20: storage / IO error
    // 30: pipeline or provider failure
    // 40: aborted by the operator
    // 50: internal/uncategorized
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Geo(e) => match e {
                GeoError::Config(_) => 11,
                GeoError::RunNotFound(_) => 12,
                GeoError::Storage(_) => 20,
                GeoError::Pipeline { .. } | GeoError::Provider(_) => 30,
                GeoError::Aborted(_) => 40,
            },
            Self::Logging(_) => 20,
            Self::Anyhow(_) => 50,
        }
    }
}
