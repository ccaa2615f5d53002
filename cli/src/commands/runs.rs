use geoprobe_core::api::{layout, AppConfig, FileSystemStorage, GeoError, RunMetadata, Storage, StorageExt};

use super::cli::RunsArgs;
use crate::error::CliError;

pub async fn run(args: RunsArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let storage = FileSystemStorage::new(&cfg.output_dir);

    if let Some(run_id) = args.run_id {
        let meta = load_metadata(&storage, &run_id)
            .await?
            .ok_or_else(|| GeoError::RunNotFound(run_id.clone()))?;
        let json = serde_json::to_string_pretty(&meta).map_err(anyhow::Error::from)?;
        println!("{json}");
        println!("dir: {}", storage.run_dir(&run_id).display());
        return Ok(0);
    }

    let runs = storage.list_runs().await.map_err(GeoError::from)?;
    if runs.is_empty() {
        println!("no runs under {}", cfg.output_dir);
        return Ok(0);
    }
    for run_id in runs.iter().take(args.limit) {
        match load_metadata(&storage, run_id).await {
            Ok(Some(meta)) => println!("{}", format_row(&meta)),
            Ok(None) => println!("{run_id:<34} (no metadata)"),
            Err(e) => println!("{run_id:<34} (unreadable: {e})"),
        }
    }
    Ok(0)
}

async fn load_metadata(storage: &FileSystemStorage, run_id: &str) -> Result<Option<RunMetadata>, GeoError> {
    if !storage.run_exists(run_id).await {
        return Ok(None);
    }
    Ok(storage.load::<RunMetadata>(run_id, layout::METADATA).await?)
}

fn format_row(meta: &RunMetadata) -> String {
    let subject = meta
        .brand
        .as_deref()
        .or(meta.category.as_deref())
        .unwrap_or("-");
    format!(
        "{:<34} {:<12} {:<22} {}",
        meta.run_id, meta.kind, meta.status, subject
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_prefers_brand_then_category() {
        let mut meta = RunMetadata::new("lb-1", "leaderboard", "2025-01-01T00:00:00Z");
        meta.category = Some("CRM".into());
        meta.status = "stopped-after-extraction".into();
        let row = format_row(&meta);
        assert!(row.starts_with("lb-1"));
        assert!(row.contains("stopped-after-extraction"));
        assert!(row.ends_with("CRM"));
    }

    #[tokio::test]
    async fn lists_runs_from_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSystemStorage::new(dir.path());
        storage.create_run_dir("run-20250101-000000-aaaaaa").await.unwrap();
        let mut meta = RunMetadata::new("run-20250101-000000-aaaaaa", "run", "now");
        meta.brand = Some("Acme".into());
        storage.save_metadata(&meta).await.unwrap();

        let loaded = load_metadata(&storage, "run-20250101-000000-aaaaaa").await.unwrap().unwrap();
        assert_eq!(loaded.brand.as_deref(), Some("Acme"));
        assert!(load_metadata(&storage, "run-missing").await.unwrap().is_none());
    }
}
