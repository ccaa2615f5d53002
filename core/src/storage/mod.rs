//! Run-artifact persistence.
//!
//! Every checkpoint is a JSON document addressed by `run_id` plus a path
//! relative to the run directory (see [`layout`]). Resume reads these files
//! and nothing else.

mod fs;
pub mod layout;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::RunMetadata;

pub use fs::FileSystemStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_json(&self, run_id: &str, rel: &str, value: &Value) -> Result<(), StorageError>;

    /// `Ok(None)` when the artifact does not exist. A file that exists but
    /// does not parse is `StorageError::Corrupt`.
    async fn load_json(&self, run_id: &str, rel: &str) -> Result<Option<Value>, StorageError>;

    async fn save_text(&self, run_id: &str, rel: &str, text: &str) -> Result<(), StorageError>;

    fn run_dir(&self, run_id: &str) -> PathBuf;

    async fn list_runs(&self) -> Result<Vec<String>, StorageError>;

    async fn create_run_dir(&self, run_id: &str) -> Result<PathBuf, StorageError>;

    async fn run_exists(&self, run_id: &str) -> bool;

    async fn save_metadata(&self, meta: &RunMetadata) -> Result<(), StorageError> {
        let value = serde_json::to_value(meta)?;
        self.save_json(&meta.run_id, layout::METADATA, &value).await
    }
}

/// Typed helpers over the object-safe [`Storage`] trait.
#[async_trait]
pub trait StorageExt: Storage {
    async fn save<T>(&self, run_id: &str, rel: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value)?;
        self.save_json(run_id, rel, &value).await
    }

    async fn load<T>(&self, run_id: &str, rel: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned,
    {
        match self.load_json(run_id, rel).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StorageError::Corrupt {
                    path: self.run_dir(run_id).join(rel),
                    source,
                }),
        }
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}
