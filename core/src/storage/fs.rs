use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{layout, Storage};
use crate::error::StorageError;

/// JSON-file storage rooted at `output_dir`, one directory per run.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn checked_dir(&self, run_id: &str) -> Result<PathBuf, StorageError> {
        if !layout::is_valid_run_id(run_id) {
            return Err(StorageError::InvalidRunId(run_id.to_string()));
        }
        Ok(self.root.join(run_id))
    }
}

/// Writes `bytes` to a hidden sibling, fsyncs, then renames over `path` so a
/// reader never observes a half-written checkpoint.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }

    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("artifact");
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let tmp = path.with_file_name(format!(".{}.tmp.{}.{}", name, std::process::id(), ts));

    let write = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    };

    if let Err(e) = write.await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StorageError::io(path, e));
    }
    Ok(())
}

#[async_trait]
impl Storage for FileSystemStorage {
    async fn save_json(&self, run_id: &str, rel: &str, value: &Value) -> Result<(), StorageError> {
        let path = self.checked_dir(run_id)?.join(rel);
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        write_atomic(&path, &bytes).await?;
        debug!(target: "geoprobe.storage", stage = "storage.save", run_id, rel, bytes = bytes.len());
        Ok(())
    }

    async fn load_json(&self, run_id: &str, rel: &str) -> Result<Option<Value>, StorageError> {
        let path = self.checked_dir(run_id)?.join(rel);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt { path, source })
    }

    async fn save_text(&self, run_id: &str, rel: &str, text: &str) -> Result<(), StorageError> {
        let path = self.checked_dir(run_id)?.join(rel);
        write_atomic(&path, text.as_bytes()).await
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }

    async fn list_runs(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.root, e)),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.root, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().to_string();
            if is_dir && layout::RUN_PREFIXES.iter().any(|p| name.starts_with(p)) {
                runs.push(name);
            }
        }
        runs.sort_unstable_by(|a, b| b.cmp(a));
        Ok(runs)
    }

    async fn create_run_dir(&self, run_id: &str) -> Result<PathBuf, StorageError> {
        let dir = self.checked_dir(run_id)?;
        for sub in layout::RUN_SUBDIRS {
            let path = dir.join(sub);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| StorageError::io(&path, e))?;
        }
        Ok(dir)
    }

    async fn run_exists(&self, run_id: &str) -> bool {
        let Ok(dir) = self.checked_dir(run_id) else {
            return false;
        };
        tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
